use std::time::Duration;

use transport_authorizations::{
    models::UpdateAuthorizationRequest,
    notices::ChangeTarget,
    query::{AuthorizationFilter, AuthorizationSortKey, SortDirection},
    repository::seed,
    view_state::{
        AuthorizationView, EditUserMode, EditUserModal, ListViewState, RequestSequencer, Section,
        ShellState, UsersView,
    },
};

// --- Shell ---

#[test]
fn test_shell_starts_on_users_with_notice() {
    let shell = ShellState::new(false);
    assert_eq!(shell.section, Section::Users);
    assert_eq!(shell.users_view, UsersView::List);
    assert!(shell.notice_open);
    assert!(!ShellState::new(true).notice_open);
}

#[test]
fn test_disabled_sections_are_not_navigable() {
    let mut shell = ShellState::new(true);
    for section in [Section::Panel, Section::Services, Section::Drivers, Section::Reports, Section::Geo] {
        assert!(!shell.navigate(section));
        assert_eq!(shell.section, Section::Users);
    }
    assert!(shell.navigate(Section::Authorizations));
    assert_eq!(shell.section, Section::Authorizations);
}

#[test]
fn test_following_a_change_closes_the_notice() {
    let mut shell = ShellState::new(false);
    shell.follow_change(ChangeTarget::FirstUserDetail, Some(seed::MARIA));
    assert!(!shell.notice_open);
    assert_eq!(shell.section, Section::Users);
    assert_eq!(shell.users_view, UsersView::Detail { user_id: seed::MARIA });

    let mut shell = ShellState::new(false);
    shell.follow_change(ChangeTarget::FirstUserDetail, None);
    assert_eq!(shell.users_view, UsersView::List);

    let mut shell = ShellState::new(false);
    shell.authorization_view.open(seed::ANA_AUTH);
    shell.follow_change(ChangeTarget::CreateAuthorization, None);
    assert_eq!(shell.section, Section::Authorizations);
    assert!(shell.create_modal_open);
    assert_eq!(shell.authorization_view, AuthorizationView::List);

    let mut shell = ShellState::new(false);
    shell.follow_change(ChangeTarget::Authorizations, None);
    assert_eq!(shell.section, Section::Authorizations);
    assert!(!shell.create_modal_open);
}

#[test]
fn test_authorization_detail_navigation() {
    let mut view = AuthorizationView::default();
    assert_eq!(view.selected(), None);
    view.open(seed::JUAN_AUTH);
    assert_eq!(view.selected(), Some(seed::JUAN_AUTH));
    view.back();
    assert_eq!(view, AuthorizationView::List);
}

// --- Edit-User Modal ---

#[test]
fn test_edit_modal_buffers_authorization_until_save() {
    let authorization = seed::authorizations().remove(0);
    let mut modal = EditUserModal::new(seed::MARIA);
    assert_eq!(modal.mode(), &EditUserMode::EditingUser);
    assert!(!modal.update_buffer(|b| b.voucher = "X".to_string()));

    modal.edit_authorization(&authorization);
    assert!(modal.update_buffer(|b| b.authorized_services = 40));

    let (id, buffer) = modal.save().unwrap();
    assert_eq!(id, authorization.id);
    assert_eq!(buffer.authorized_services, 40);
    assert_eq!(buffer.voucher, authorization.voucher);
    assert_eq!(modal.mode(), &EditUserMode::EditingUser);
    assert!(modal.save().is_none());
}

#[test]
fn test_edit_modal_cancel_discards_buffer() {
    let authorization = seed::authorizations().remove(0);
    let mut modal = EditUserModal::new(seed::MARIA);
    modal.edit_authorization(&authorization);
    modal.update_buffer(|b| b.mipres = "CHANGED".to_string());
    modal.cancel();
    assert!(modal.save().is_none());

    modal.edit_authorization(&authorization);
    match modal.mode() {
        EditUserMode::EditingAuthorization { buffer, .. } => {
            assert_eq!(buffer, &UpdateAuthorizationRequest::from(&authorization));
        }
        EditUserMode::EditingUser => panic!("expected authorization editing"),
    }
}

// --- Stale Requests ---

#[test]
fn test_only_latest_ticket_is_current() {
    let sequencer = RequestSequencer::new();
    let first = sequencer.issue();
    assert!(sequencer.is_current(first));
    let second = sequencer.issue();
    assert!(!sequencer.is_current(first));
    assert!(sequencer.is_current(second));
}

#[tokio::test]
async fn test_slow_response_is_dropped_when_superseded() {
    let sequencer = RequestSequencer::new();

    let slow = sequencer.run_latest(async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        "slow"
    });
    let fast = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        sequencer.run_latest(async { "fast" }).await
    };

    let (slow, fast) = tokio::join!(slow, fast);
    assert_eq!(slow, None);
    assert_eq!(fast, Some("fast"));
}

// --- List View ---

#[test]
fn test_list_view_resets_page_on_filter_and_size_changes() {
    let mut view: ListViewState<AuthorizationFilter, AuthorizationSortKey> = ListViewState::default();
    assert_eq!(view.page(), 1);
    assert_eq!(view.page_size(), 10);

    view.set_page(3);
    view.set_filter(AuthorizationFilter {
        search: Some("AUTH".to_string()),
        ..AuthorizationFilter::default()
    });
    assert_eq!(view.page(), 1);
    assert_eq!(view.filter().search.as_deref(), Some("AUTH"));

    view.set_page(2);
    view.set_page_size(25);
    assert_eq!(view.page(), 1);
    assert_eq!(view.page_size(), 25);
}

#[test]
fn test_list_view_sort_and_page_count() {
    let mut view: ListViewState<AuthorizationFilter, AuthorizationSortKey> = ListViewState::default();
    view.request_sort(AuthorizationSortKey::EndDate);
    let spec = view.request_sort(AuthorizationSortKey::EndDate);
    assert_eq!(spec.direction, SortDirection::Descending);
    assert_eq!(view.sort(), Some(spec));

    assert_eq!(view.page_count(0), 1);
    assert_eq!(view.page_count(10), 1);
    assert_eq!(view.page_count(11), 2);
}
