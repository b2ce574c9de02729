use ballot_engine::{SessionConfig, VotingSession};
use ballot_store::{FileSnapshotStore, SessionStore, SnapshotStore, StoreError};
use ballot_types::{ProposalId, SessionSnapshot, VoterAddress, WorkflowStatus};

fn admin() -> VoterAddress {
    VoterAddress::new("admin")
}

#[test]
fn test_missing_file_loads_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path().join("session.json"));
    assert!(store.load().unwrap().is_none());
    assert!(!store.exists().unwrap());
}

#[test]
fn test_save_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path().join("nested/deeper/session.json"));
    store.save(&SessionSnapshot::genesis(admin())).unwrap();

    assert!(store.exists().unwrap());
    assert_eq!(
        store.load().unwrap(),
        Some(SessionSnapshot::genesis(admin()))
    );
    assert!(!dir.path().join("nested/deeper/session.json.tmp").exists());
}

#[test]
fn test_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let a = VoterAddress::new("a");

    {
        let store = SessionStore::new(FileSnapshotStore::new(&path), SessionConfig::default());
        let session = VotingSession::new(admin());
        session.add_voter(&admin(), a.clone()).unwrap();
        session.start_proposals_registering(&admin()).unwrap();
        session.add_proposal(&a, "P1").unwrap();
        session.end_proposals_registering(&admin()).unwrap();
        session.start_voting_session(&admin()).unwrap();
        session.cast_vote(&a, ProposalId::new(0)).unwrap();
        store.create(&session).unwrap();
    }

    let store = SessionStore::new(FileSnapshotStore::new(&path), SessionConfig::default());
    let session = store.open().unwrap();
    assert_eq!(session.workflow_status(), WorkflowStatus::VotingSessionStarted);
    assert!(session.get_voter(&a, &a).unwrap().has_voted);

    session.end_voting_session(&admin()).unwrap();
    session.tally_votes(&admin()).unwrap();
    store.persist(&session).unwrap();

    let reopened = store.open().unwrap();
    assert_eq!(reopened.winning_proposal_id(), Some(ProposalId::new(0)));
}

#[test]
fn test_corrupt_file_is_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let store = FileSnapshotStore::new(&path);
    assert!(matches!(store.load(), Err(StoreError::Serialization(_))));
}
