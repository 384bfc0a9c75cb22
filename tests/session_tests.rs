/// Session protocol tests
///
/// Command sequencing, validation faults and the string protocol
/// Run with: cargo test --test session_tests

use rustmemkv::{
    Command, CommandOutput, Database, DatabaseConfig, DbError, IsolationLevel, NO_RECORD,
    SessionState, TransactionConflict, TransactionState, create_database,
};

#[test]
fn test_set_get_round_trip() {
    let db = create_database(IsolationLevel::ReadCommitted);
    let mut session = db.create_session();

    session.begin().unwrap();
    session.set("greeting", "hello").unwrap();
    assert_eq!(session.get("greeting").unwrap(), "hello");
    session.delete("greeting").unwrap();
    assert_eq!(session.get("greeting").unwrap(), NO_RECORD);
    assert_eq!(session.commit().unwrap(), "");
}

#[test]
fn test_state_machine() {
    let db = Database::default();
    let mut session = db.create_session();
    assert_eq!(session.state(), SessionState::Idle);

    session.begin().unwrap();
    assert_eq!(session.state(), SessionState::InTransaction);

    session.commit().unwrap();
    assert_eq!(session.state(), SessionState::Idle);

    session.begin().unwrap();
    session.abort().unwrap();
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_validation_faults() {
    let db = Database::default();
    let mut session = db.create_session();

    assert!(matches!(session.commit(), Err(DbError::NoActiveTransaction)));
    assert!(matches!(session.abort(), Err(DbError::NoActiveTransaction)));
    assert!(matches!(session.get("x"), Err(DbError::NoActiveTransaction)));

    session.begin().unwrap();
    assert!(matches!(session.begin(), Err(DbError::TransactionAlreadyActive)));
    assert!(session.is_in_transaction());
}

#[test]
fn test_finished_transaction_accepts_no_commands() {
    let db = Database::default();
    let mut session = db.create_session();

    session.begin().unwrap();
    let id = session.transaction_id().unwrap();
    session.commit().unwrap();

    assert!(matches!(session.set("x", "1"), Err(DbError::NoActiveTransaction)));

    let manager = db.transaction_manager();
    assert!(manager.upsert(id, "x", "1").is_err());
    assert!(manager.complete(id, TransactionState::Aborted).is_err());
    assert_eq!(
        manager.transaction_info(id).unwrap().unwrap().state,
        TransactionState::Committed
    );
}

#[test]
fn test_conflict_is_a_result_not_a_fault() {
    let db = Database::new(IsolationLevel::Snapshot);
    let mut a = db.create_session();
    let mut b = db.create_session();
    a.begin().unwrap();
    b.begin().unwrap();
    let b_id = b.transaction_id().unwrap();

    a.execute(Command::set("x", "1")).unwrap();
    b.execute(Command::set("x", "2")).unwrap();
    assert_eq!(a.execute(Command::Commit).unwrap(), CommandOutput::Done);

    let output = b.execute(Command::Commit).unwrap();
    assert_eq!(output, CommandOutput::Conflict(TransactionConflict::WriteWrite));
    assert_eq!(b.state(), SessionState::Idle);

    let info = db.transaction_manager().transaction_info(b_id).unwrap().unwrap();
    assert_eq!(info.state, TransactionState::Aborted);
}

#[test]
fn test_execute_dispatch() {
    let db = Database::default();
    let mut session = db.create_session();

    assert_eq!(session.execute(Command::Begin).unwrap(), CommandOutput::Done);
    assert_eq!(session.execute(Command::get("k")).unwrap(), CommandOutput::NoRecord);
    assert_eq!(session.execute(Command::delete("k")).unwrap(), CommandOutput::NoRecord);
    assert_eq!(session.execute(Command::set("k", "v")).unwrap(), CommandOutput::Done);
    assert_eq!(
        session.execute(Command::get("k")).unwrap(),
        CommandOutput::Value("v".into())
    );
    assert_eq!(session.execute(Command::delete("k")).unwrap(), CommandOutput::Done);
    assert_eq!(session.execute(Command::Abort).unwrap(), CommandOutput::Done);
}

#[test]
fn test_text_commands_check_arity() {
    let db = Database::default();
    let mut session = db.create_session();
    session.execute_line("begin").unwrap();

    assert!(matches!(
        session.execute_line("get"),
        Err(DbError::InvalidArguments(_))
    ));
    assert!(matches!(
        session.execute_line("set only-key"),
        Err(DbError::InvalidArguments(_))
    ));
    assert!(matches!(
        session.execute_line("truncate everything"),
        Err(DbError::UnknownCommand(_))
    ));

    // faults leave the transaction attached
    assert!(session.is_in_transaction());
    assert_eq!(session.execute_line("commit").unwrap(), CommandOutput::Done);
}

#[test]
fn test_read_and_write_sets_are_tracked() {
    let db = Database::new(IsolationLevel::Serializable);
    let mut session = db.create_session();
    session.begin().unwrap();
    let id = session.transaction_id().unwrap();

    session.get("a").unwrap();
    session.get("a").unwrap();
    session.set("b", "1").unwrap();
    session.set("b", "2").unwrap();
    session.delete("missing").unwrap();

    let info = db.transaction_manager().transaction_info(id).unwrap().unwrap();
    assert_eq!(info.reads, 1);
    assert_eq!(info.writes, 1);
}

#[test]
fn test_dropped_session_aborts_its_transaction() {
    let db = Database::new(IsolationLevel::ReadUncommitted);
    {
        let mut session = db.create_session();
        session.begin().unwrap();
        session.set("x", "dirty").unwrap();
    }

    let stats = db.stats().unwrap();
    assert_eq!(stats.manager.aborted, 1);
    assert_eq!(stats.manager.in_progress, 0);
}

#[test]
fn test_database_from_config() {
    let config = DatabaseConfig::new("orders").isolation_level(IsolationLevel::RepeatableRead);
    let db = Database::with_config(config).unwrap();
    assert_eq!(db.name(), "orders");
    assert_eq!(db.default_isolation_level().unwrap(), IsolationLevel::RepeatableRead);

    assert!(Database::with_config(DatabaseConfig::new("  ")).is_err());
    assert!(Database::from_url("rustmemkv://x?isolation=nope").is_err());
}
