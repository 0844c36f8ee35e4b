//! Route handlers organized by resource

pub mod dashboard;
pub mod health;
pub mod logs;
pub mod notifications;
pub mod orders;
pub mod tracking;
pub mod users;
pub mod vehicles;

use std::str::FromStr;

use fleetctl_core::{Pagination, ValidationError};

/// Parse an optional enum-valued query parameter; blank means absent.
pub(crate) fn parse_filter<T>(value: Option<&str>) -> Result<Option<T>, ValidationError>
where
    T: FromStr<Err = ValidationError>,
{
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::parse)
        .transpose()
}

/// Clamp raw `page` / `per_page` query values.
///
/// List queries carry these inline: `#[serde(flatten)]` breaks numeric
/// parsing in query strings.
pub(crate) fn page(page: Option<u32>, per_page: Option<u32>) -> Pagination {
    Pagination::from_query(page, per_page)
}
