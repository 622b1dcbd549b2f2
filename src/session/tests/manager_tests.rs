//! Tests for the token-keyed session registry.

use rstest::{fixture, rstest};

use super::{connection, drain, payload};
use crate::session::{
    DuplexConnection,
    ResumableSession,
    ResumeConfig,
    ResumePosition,
    ResumeToken,
    SessionError,
    SessionManager,
};

const TOKEN: &[u8] = b"resume-token";

#[expect(
    unused_braces,
    reason = "rustc false positive for single-line rstest fixtures"
)]
#[fixture]
fn manager() -> SessionManager { SessionManager::new() }

fn session(token: &'static [u8]) -> ResumableSession {
    ResumableSession::new(ResumeToken::from_static(token), &ResumeConfig::default())
}

#[rstest]
fn saved_session_is_found_by_raw_token(manager: SessionManager) {
    let saved = manager.save(session(TOKEN));
    let found = manager.get(TOKEN).expect("session registered");
    assert!(found.ptr_eq(&saved));
    assert!(manager.get(b"other").is_none());
    assert_eq!(manager.len(), 1);
}

#[rstest]
fn newer_session_supersedes_older(manager: SessionManager) {
    let older = manager.save(session(TOKEN));
    let newer = manager.save(session(TOKEN));

    assert!(older.is_disposed());
    assert!(!newer.is_disposed());
    assert_eq!(manager.session_id(TOKEN), Some(newer.id()));
    assert_eq!(manager.len(), 1);
}

#[rstest]
fn saving_same_session_twice_keeps_it_live(manager: SessionManager) {
    let saved = manager.save(session(TOKEN));
    let again = manager.save(saved.clone());
    assert!(!again.is_disposed());
    assert_eq!(manager.session_id(TOKEN), Some(saved.id()));
}

#[rstest]
fn already_disposed_session_is_not_registered(manager: SessionManager) {
    let live = manager.save(session(TOKEN));
    let stale = session(TOKEN);
    stale.dispose();

    let returned = manager.save(stale.clone());
    assert!(returned.ptr_eq(&stale));
    assert_eq!(manager.session_id(TOKEN), Some(live.id()));
    assert!(!live.is_disposed());
    assert_eq!(manager.len(), 1);
}

#[rstest]
fn disposed_session_is_never_left_mapped(manager: SessionManager) {
    let stale = session(TOKEN);
    stale.dispose();
    manager.save(stale);
    assert!(manager.get(TOKEN).is_none());
    assert!(manager.is_empty());
}

#[rstest]
fn disposed_session_leaves_the_table(manager: SessionManager) {
    let saved = manager.save(session(TOKEN));
    saved.dispose();
    assert!(manager.get(TOKEN).is_none());
    assert!(manager.is_empty());
}

#[rstest]
fn stale_close_does_not_evict_replacement(manager: SessionManager) {
    let older = manager.save(session(TOKEN));
    let newer = manager.save(session(TOKEN));
    // The superseded session's close observer has already run; closing it
    // again must not touch the replacement either.
    older.dispose();
    assert_eq!(manager.session_id(TOKEN), Some(newer.id()));
}

#[rstest]
fn transport_close_keeps_session_registered(manager: SessionManager) {
    let saved = manager.save(session(TOKEN));
    let (conn, _rx) = connection(1);
    saved.attach(conn.clone()).expect("attach");
    conn.close();
    assert!(manager.get(TOKEN).is_some());
    assert!(!saved.is_attached());
}

#[rstest]
fn dispose_disposes_every_session_and_rejects_saves(manager: SessionManager) {
    let first = manager.save(session(b"one"));
    let second = manager.save(session(b"two"));

    manager.dispose();
    assert!(manager.is_disposed());
    assert!(manager.is_empty());
    assert!(first.is_disposed());
    assert!(second.is_disposed());

    let late = manager.save(session(b"three"));
    assert!(late.is_disposed());
    assert!(manager.get(b"three").is_none());
}

#[rstest]
fn resume_by_token_replays_frames(manager: SessionManager) {
    let saved = manager.save(session(TOKEN));
    let frame = payload(1, 6);
    saved.record_sent(frame.clone()).expect("record");

    let (conn, mut rx) = connection(7);
    let (resumed, replayed) = manager
        .resume(TOKEN, conn, ResumePosition::ZERO)
        .expect("resume");
    assert!(resumed.ptr_eq(&saved));
    assert_eq!(replayed, 1);
    assert_eq!(drain(&mut rx), vec![frame]);
}

#[rstest]
fn resume_with_unknown_token_fails(manager: SessionManager) {
    let (conn, _rx) = connection(1);
    assert_eq!(
        manager
            .resume(b"missing", conn, ResumePosition::ZERO)
            .map(|(_, replayed)| replayed),
        Err(SessionError::UnknownToken {
            token: ResumeToken::from_static(b"missing"),
        })
    );
}
