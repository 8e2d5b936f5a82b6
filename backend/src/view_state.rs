//! Client-side view state of the dashboard, kept here so its transitions are tested
//! alongside the rules they drive.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::models::{Authorization, UpdateAuthorizationRequest};
use crate::notices::ChangeTarget;
use crate::query::{DEFAULT_PAGE_SIZE, SortSpec, SortState};

// --- Shell & Navigation ---

/// Sidebar entries. Only user and authorization management are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Panel,
    Users,
    Services,
    Drivers,
    Authorizations,
    Reports,
    Geo,
}

impl Section {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Section::Users | Section::Authorizations)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsersView {
    #[default]
    List,
    Detail { user_id: Uuid },
}

/// AuthorizationView
///
/// Management view: the table, or the detail of one authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationView {
    #[default]
    List,
    Detail { authorization_id: Uuid },
}

impl AuthorizationView {
    pub fn open(&mut self, authorization_id: Uuid) {
        *self = AuthorizationView::Detail { authorization_id };
    }

    pub fn back(&mut self) {
        *self = AuthorizationView::List;
    }

    pub fn selected(&self) -> Option<Uuid> {
        match self {
            AuthorizationView::List => None,
            AuthorizationView::Detail { authorization_id } => Some(*authorization_id),
        }
    }
}

/// ShellState
///
/// Top-level dashboard state: active section, the per-section views, the create
/// modal and the first-run notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    pub section: Section,
    pub users_view: UsersView,
    pub authorization_view: AuthorizationView,
    pub create_modal_open: bool,
    pub notice_open: bool,
}

impl ShellState {
    /// Starts on user management, showing the notice unless it was already dismissed.
    pub fn new(notice_seen: bool) -> Self {
        Self {
            section: Section::Users,
            users_view: UsersView::List,
            authorization_view: AuthorizationView::List,
            create_modal_open: false,
            notice_open: !notice_seen,
        }
    }

    /// Switches section. Disabled entries are ignored and `false` is returned.
    pub fn navigate(&mut self, section: Section) -> bool {
        if !section.is_enabled() {
            return false;
        }
        self.section = section;
        true
    }

    pub fn open_user(&mut self, user_id: Uuid) {
        self.section = Section::Users;
        self.users_view = UsersView::Detail { user_id };
    }

    pub fn open_create_modal(&mut self) {
        self.section = Section::Authorizations;
        self.create_modal_open = true;
    }

    pub fn close_create_modal(&mut self) {
        self.create_modal_open = false;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice_open = false;
    }

    /// Follows a change picked from the notice, which closes it. `first_user` is the first
    /// row of the user table; without one the user list is shown instead.
    pub fn follow_change(&mut self, target: ChangeTarget, first_user: Option<Uuid>) {
        self.notice_open = false;
        match target {
            ChangeTarget::FirstUserDetail => match first_user {
                Some(user_id) => self.open_user(user_id),
                None => {
                    self.section = Section::Users;
                    self.users_view = UsersView::List;
                }
            },
            ChangeTarget::Authorizations => {
                self.section = Section::Authorizations;
                self.authorization_view.back();
            }
            ChangeTarget::CreateAuthorization => {
                self.authorization_view.back();
                self.open_create_modal();
            }
        }
    }
}

// --- Edit-User Modal ---

#[derive(Debug, Clone, PartialEq)]
pub enum EditUserMode {
    EditingUser,
    EditingAuthorization {
        authorization_id: Uuid,
        buffer: UpdateAuthorizationRequest,
    },
}

/// EditUserModal
///
/// The user edit form, which can switch to editing one of the user's authorizations
/// in place. The edit buffer is a snapshot; nothing is applied until `save`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditUserModal {
    pub user_id: Uuid,
    mode: EditUserMode,
}

impl EditUserModal {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            mode: EditUserMode::EditingUser,
        }
    }

    pub fn mode(&self) -> &EditUserMode {
        &self.mode
    }

    pub fn edit_authorization(&mut self, authorization: &Authorization) {
        self.mode = EditUserMode::EditingAuthorization {
            authorization_id: authorization.id,
            buffer: UpdateAuthorizationRequest::from(authorization),
        };
    }

    /// Applies `edit` to the buffer. Returns `false` when no authorization is being edited.
    pub fn update_buffer(&mut self, edit: impl FnOnce(&mut UpdateAuthorizationRequest)) -> bool {
        match &mut self.mode {
            EditUserMode::EditingAuthorization { buffer, .. } => {
                edit(buffer);
                true
            }
            EditUserMode::EditingUser => false,
        }
    }

    /// Returns to the user form, yielding the edited buffer to submit.
    pub fn save(&mut self) -> Option<(Uuid, UpdateAuthorizationRequest)> {
        match std::mem::replace(&mut self.mode, EditUserMode::EditingUser) {
            EditUserMode::EditingAuthorization {
                authorization_id,
                buffer,
            } => Some((authorization_id, buffer)),
            EditUserMode::EditingUser => None,
        }
    }

    pub fn cancel(&mut self) {
        self.mode = EditUserMode::EditingUser;
    }
}

// --- Stale-Request Guard ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// RequestSequencer
///
/// Hands out increasing tickets for a view's fetches. Only the holder of the most
/// recent ticket may apply its result; older responses are dropped.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Runs `fetch` under a fresh ticket. Yields `None` if a newer fetch started meanwhile.
    pub async fn run_latest<F, T>(&self, fetch: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.issue();
        let output = fetch.await;
        self.is_current(ticket).then_some(output)
    }
}

// --- List View ---

/// ListViewState
///
/// Filters, sort, page and page size of one table. Changing the filter or the page
/// size goes back to page 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ListViewState<F, K> {
    filter: F,
    sort: SortState<K>,
    page: u32,
    page_size: u32,
}

impl<F: Default, K> Default for ListViewState<F, K> {
    fn default() -> Self {
        Self {
            filter: F::default(),
            sort: SortState::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE as u32,
        }
    }
}

impl<F, K: Copy + PartialEq> ListViewState<F, K> {
    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> Option<SortSpec<K>> {
        self.sort.current()
    }

    pub fn set_filter(&mut self, filter: F) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn request_sort(&mut self, key: K) -> SortSpec<K> {
        self.sort.request(key)
    }

    /// Number of pages for `total` filtered records, at least one.
    pub fn page_count(&self, total: usize) -> u32 {
        (total.div_ceil(self.page_size as usize) as u32).max(1)
    }
}
