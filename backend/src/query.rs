//! Filtering, sorting and pagination of the management tables.
//!
//! Each sortable collection gets its own key enum with a typed comparator, so no
//! ordering depends on looking a property up by name at runtime.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{Authorization, AuthorizationListItem, Page, UserSummary, ValidityStatus};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

// --- Sorting ---

/// SortDirection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// A comparator over one field of `T`.
pub trait SortKey<T>: Copy {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K> SortSpec<K> {
    pub fn ascending(key: K) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// Stable sort of `items` by this spec.
    pub fn sort<T>(&self, items: &mut [T])
    where
        K: SortKey<T>,
    {
        items.sort_by(|a, b| self.direction.apply(self.key.compare(a, b)));
    }
}

/// SortState
///
/// Column-header sort toggle. Selecting the key that is already sorted ascending
/// flips it to descending; any other selection sorts ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<K> {
    current: Option<SortSpec<K>>,
}

impl<K> Default for SortState<K> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<K: Copy + PartialEq> SortState<K> {
    pub fn current(&self) -> Option<SortSpec<K>> {
        self.current
    }

    pub fn request(&mut self, key: K) -> SortSpec<K> {
        let direction = match self.current {
            Some(spec) if spec.key == key && spec.direction == SortDirection::Ascending => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        let spec = SortSpec { key, direction };
        self.current = Some(spec);
        spec
    }
}

fn spec_from<K>(key: Option<K>, direction: Option<SortDirection>) -> Option<SortSpec<K>> {
    key.map(|key| SortSpec {
        key,
        direction: direction.unwrap_or_default(),
    })
}

// --- Pagination ---

/// PageRequest
///
/// A 1-based page and a page size clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn from_parts(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.map_or(1, |p| p.max(1) as usize);
        let limit = limit.map_or(DEFAULT_PAGE_SIZE, |l| (l as usize).clamp(1, MAX_PAGE_SIZE));
        Self { page, limit }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

/// Slices one page out of an already filtered and sorted collection.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let data = items
        .into_iter()
        .skip(request.offset())
        .take(request.limit)
        .collect();
    Page { data, total }
}

/// Filter, then sort, then paginate.
pub fn run_query<T, K>(
    items: impl IntoIterator<Item = T>,
    keep: impl Fn(&T) -> bool,
    sort: Option<SortSpec<K>>,
    page: PageRequest,
) -> Page<T>
where
    K: SortKey<T>,
{
    let mut filtered: Vec<T> = items.into_iter().filter(|item| keep(item)).collect();
    if let Some(spec) = sort {
        spec.sort(&mut filtered);
    }
    paginate(filtered, page)
}

// --- Matching Helpers ---

/// Returns the trimmed filter text, or `None` when the filter is absent or blank.
pub fn active(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn text_matches(filter: &Option<String>, value: &str) -> bool {
    active(filter).is_none_or(|needle| contains_ci(value, needle))
}

fn exact_matches(filter: &Option<String>, value: &str) -> bool {
    active(filter).is_none_or(|wanted| value == wanted)
}

/// Inclusive window filter: the record must start on or after `from` and end on or before `to`.
pub fn within_window(
    start_date: NaiveDate,
    end_date: NaiveDate,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> bool {
    from.is_none_or(|from| start_date >= from) && to.is_none_or(|to| end_date <= to)
}

// --- Users ---

/// UserSortKey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UserSortKey {
    FullName,
    NationalId,
    Phone,
    Client,
    Dependency,
    Provider,
    RequestsService,
}

impl SortKey<UserSummary> for UserSortKey {
    fn compare(&self, a: &UserSummary, b: &UserSummary) -> Ordering {
        let (a, b) = (&a.user, &b.user);
        match self {
            UserSortKey::FullName => a.full_name.cmp(&b.full_name),
            UserSortKey::NationalId => a.national_id.cmp(&b.national_id),
            UserSortKey::Phone => a.phone.cmp(&b.phone),
            UserSortKey::Client => a.client.cmp(&b.client),
            UserSortKey::Dependency => a.dependency.cmp(&b.dependency),
            UserSortKey::Provider => a.provider.cmp(&b.provider),
            UserSortKey::RequestsService => a.requests_service.cmp(&b.requests_service),
        }
    }
}

impl UserSortKey {
    pub fn column(&self) -> &'static str {
        match self {
            UserSortKey::FullName => "full_name",
            UserSortKey::NationalId => "national_id",
            UserSortKey::Phone => "phone",
            UserSortKey::Client => "client",
            UserSortKey::Dependency => "dependency",
            UserSortKey::Provider => "provider",
            UserSortKey::RequestsService => "requests_service",
        }
    }
}

/// UserQuery
///
/// Query parameters of GET /users.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Matches name, national ID, phone or any group code.
    pub search: Option<String>,
    pub dependency: Option<String>,
    pub provider: Option<String>,
    pub sort_by: Option<UserSortKey>,
    pub sort_direction: Option<SortDirection>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl UserQuery {
    pub fn matches(&self, summary: &UserSummary) -> bool {
        let user = &summary.user;
        let search_hit = active(&self.search).is_none_or(|needle| {
            contains_ci(&user.full_name, needle)
                || contains_ci(&user.national_id, needle)
                || contains_ci(&user.phone, needle)
                || summary
                    .authorization_groups
                    .iter()
                    .any(|group| contains_ci(&group.unique_code, needle))
        });
        search_hit
            && exact_matches(&self.dependency, &user.dependency)
            && exact_matches(&self.provider, &user.provider)
    }

    pub fn sort_spec(&self) -> Option<SortSpec<UserSortKey>> {
        spec_from(self.sort_by, self.sort_direction)
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_parts(self.page, self.limit)
    }
}

// --- Authorization Management ---

/// ValidityFilter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum ValidityFilter {
    #[default]
    #[serde(rename = "TODOS")]
    Todos,
    #[serde(rename = "VIGENTE")]
    Vigente,
    #[serde(rename = "NO VIGENTE")]
    NoVigente,
}

impl ValidityFilter {
    pub fn status(&self) -> Option<ValidityStatus> {
        match self {
            ValidityFilter::Todos => None,
            ValidityFilter::Vigente => Some(ValidityStatus::Vigente),
            ValidityFilter::NoVigente => Some(ValidityStatus::NoVigente),
        }
    }
}

/// AuthorizationSortKey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AuthorizationSortKey {
    UniqueCode,
    FullName,
    Identification,
    Voucher,
    Mipres,
    OriginCity,
    DestinationCity,
    AuthorizedServices,
    RemainingServices,
    StartDate,
    EndDate,
    Dependency,
    Validity,
    Provider,
}

impl SortKey<AuthorizationListItem> for AuthorizationSortKey {
    fn compare(&self, a: &AuthorizationListItem, b: &AuthorizationListItem) -> Ordering {
        let (ra, rb) = (&a.row, &b.row);
        match self {
            AuthorizationSortKey::UniqueCode => ra.unique_code.cmp(&rb.unique_code),
            AuthorizationSortKey::FullName => ra.full_name.cmp(&rb.full_name),
            AuthorizationSortKey::Identification => ra.identification.cmp(&rb.identification),
            AuthorizationSortKey::Voucher => ra.voucher.cmp(&rb.voucher),
            AuthorizationSortKey::Mipres => ra.mipres.cmp(&rb.mipres),
            AuthorizationSortKey::OriginCity => ra.origin_city.cmp(&rb.origin_city),
            AuthorizationSortKey::DestinationCity => ra.destination_city.cmp(&rb.destination_city),
            AuthorizationSortKey::AuthorizedServices => {
                ra.authorized_services.cmp(&rb.authorized_services)
            }
            AuthorizationSortKey::RemainingServices => {
                ra.remaining_services.cmp(&rb.remaining_services)
            }
            AuthorizationSortKey::StartDate => ra.start_date.cmp(&rb.start_date),
            AuthorizationSortKey::EndDate => ra.end_date.cmp(&rb.end_date),
            AuthorizationSortKey::Dependency => ra.dependency.cmp(&rb.dependency),
            AuthorizationSortKey::Validity => a.validity_status.cmp(&b.validity_status),
            AuthorizationSortKey::Provider => ra.provider.cmp(&rb.provider),
        }
    }
}

impl AuthorizationSortKey {
    /// SQL expression for this key in the management query. `Validity` has no column;
    /// it is ordered by comparing the end date with the current date.
    pub fn column(&self) -> Option<&'static str> {
        Some(match self {
            AuthorizationSortKey::UniqueCode => "a.unique_code",
            AuthorizationSortKey::FullName => "u.full_name",
            AuthorizationSortKey::Identification => "u.national_id",
            AuthorizationSortKey::Voucher => "a.voucher",
            AuthorizationSortKey::Mipres => "a.mipres",
            AuthorizationSortKey::OriginCity => "a.origin_city",
            AuthorizationSortKey::DestinationCity => "a.destination_city",
            AuthorizationSortKey::AuthorizedServices => "a.authorized_services",
            AuthorizationSortKey::RemainingServices => "a.remaining_services",
            AuthorizationSortKey::StartDate => "a.start_date",
            AuthorizationSortKey::EndDate => "a.end_date",
            AuthorizationSortKey::Dependency => "u.dependency",
            AuthorizationSortKey::Provider => "a.provider",
            AuthorizationSortKey::Validity => return None,
        })
    }
}

/// AuthorizationFilter
///
/// Filter part of the management table query, shared by the list and the export.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizationFilter {
    /// Matches code, holder name, identification, voucher or MiPres.
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Exact identification of the holder.
    pub identification: Option<String>,
    pub unique_code: Option<String>,
    pub mipres: Option<String>,
    pub voucher: Option<String>,
    pub dependency: Option<String>,
    pub validity: Option<ValidityFilter>,
}

impl AuthorizationFilter {
    pub fn matches(&self, item: &AuthorizationListItem) -> bool {
        let row = &item.row;
        let search_hit = active(&self.search).is_none_or(|needle| {
            contains_ci(&row.unique_code, needle)
                || contains_ci(&row.full_name, needle)
                || contains_ci(&row.identification, needle)
                || contains_ci(&row.voucher, needle)
                || contains_ci(&row.mipres, needle)
        });
        let validity_hit = self
            .validity
            .and_then(|v| v.status())
            .is_none_or(|wanted| item.validity_status == wanted);

        search_hit
            && within_window(row.start_date, row.end_date, self.start_date, self.end_date)
            && exact_matches(&self.identification, &row.identification)
            && text_matches(&self.unique_code, &row.unique_code)
            && text_matches(&self.mipres, &row.mipres)
            && text_matches(&self.voucher, &row.voucher)
            && exact_matches(&self.dependency, &row.dependency)
            && validity_hit
    }
}

/// AuthorizationListParams
///
/// Sort and page parameters of the management table.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizationListParams {
    pub sort_by: Option<AuthorizationSortKey>,
    pub sort_direction: Option<SortDirection>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AuthorizationListParams {
    pub fn sort_spec(&self) -> Option<SortSpec<AuthorizationSortKey>> {
        spec_from(self.sort_by, self.sort_direction)
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_parts(self.page, self.limit)
    }
}

/// AuthorizationQuery
///
/// A full management-table request: what to show and how to order and slice it.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationQuery {
    pub filter: AuthorizationFilter,
    pub params: AuthorizationListParams,
}

impl AuthorizationQuery {
    pub fn new(filter: AuthorizationFilter, params: AuthorizationListParams) -> Self {
        Self { filter, params }
    }
}

// --- A User's Authorizations ---

/// UserAuthorizationSortKey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UserAuthorizationSortKey {
    UniqueCode,
    Mipres,
    Voucher,
    StartDate,
    EndDate,
    AuthorizedServices,
    RemainingServices,
    Provider,
}

impl SortKey<Authorization> for UserAuthorizationSortKey {
    fn compare(&self, a: &Authorization, b: &Authorization) -> Ordering {
        match self {
            UserAuthorizationSortKey::UniqueCode => a.unique_code.cmp(&b.unique_code),
            UserAuthorizationSortKey::Mipres => a.mipres.cmp(&b.mipres),
            UserAuthorizationSortKey::Voucher => a.voucher.cmp(&b.voucher),
            UserAuthorizationSortKey::StartDate => a.start_date.cmp(&b.start_date),
            UserAuthorizationSortKey::EndDate => a.end_date.cmp(&b.end_date),
            UserAuthorizationSortKey::AuthorizedServices => {
                a.authorized_services.cmp(&b.authorized_services)
            }
            UserAuthorizationSortKey::RemainingServices => {
                a.remaining_services.cmp(&b.remaining_services)
            }
            UserAuthorizationSortKey::Provider => a.provider.cmp(&b.provider),
        }
    }
}

impl UserAuthorizationSortKey {
    pub fn column(&self) -> &'static str {
        match self {
            UserAuthorizationSortKey::UniqueCode => "unique_code",
            UserAuthorizationSortKey::Mipres => "mipres",
            UserAuthorizationSortKey::Voucher => "voucher",
            UserAuthorizationSortKey::StartDate => "start_date",
            UserAuthorizationSortKey::EndDate => "end_date",
            UserAuthorizationSortKey::AuthorizedServices => "authorized_services",
            UserAuthorizationSortKey::RemainingServices => "remaining_services",
            UserAuthorizationSortKey::Provider => "provider",
        }
    }
}

/// UserAuthorizationQuery
///
/// Query parameters of GET /users/{id}/authorizations.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserAuthorizationQuery {
    /// Matches voucher or MiPres.
    pub search: Option<String>,
    /// Exact unique code.
    pub unique_code: Option<String>,
    pub mipres: Option<String>,
    pub voucher: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_by: Option<UserAuthorizationSortKey>,
    pub sort_direction: Option<SortDirection>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl UserAuthorizationQuery {
    pub fn matches(&self, user_id: Uuid, a: &Authorization) -> bool {
        let search_hit = active(&self.search)
            .is_none_or(|needle| contains_ci(&a.voucher, needle) || contains_ci(&a.mipres, needle));
        a.user_id == user_id
            && search_hit
            && exact_matches(&self.unique_code, &a.unique_code)
            && text_matches(&self.mipres, &a.mipres)
            && text_matches(&self.voucher, &a.voucher)
            && within_window(a.start_date, a.end_date, self.start_date, self.end_date)
    }

    pub fn sort_spec(&self) -> Option<SortSpec<UserAuthorizationSortKey>> {
        spec_from(self.sort_by, self.sort_direction)
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_parts(self.page, self.limit)
    }
}

/// Escapes the LIKE metacharacters of `fragment`.
pub fn escape_like(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Substring LIKE pattern for `fragment`.
pub fn like_pattern(fragment: &str) -> String {
    format!("%{}%", escape_like(fragment))
}
