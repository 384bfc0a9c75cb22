// ============================================================================
// Isolation level walkthroughs
// ============================================================================
//
// Each scenario drives a few sessions against a fresh database in a fixed
// interleaving and checks what every session observes.
//
// ============================================================================

use anyhow::{Result, ensure};
use clap::ValueEnum;
use rustmemkv::{Database, IsolationLevel, NO_RECORD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
    All,
}

impl Scenario {
    const LEVELS: [Scenario; 5] = [
        Scenario::ReadUncommitted,
        Scenario::ReadCommitted,
        Scenario::RepeatableRead,
        Scenario::Snapshot,
        Scenario::Serializable,
    ];

    /// The walkthroughs this selection stands for
    fn walkthroughs(self) -> Vec<fn() -> Result<&'static str>> {
        let selected: &[Scenario] = match self {
            Scenario::All => &Self::LEVELS,
            _ => std::slice::from_ref(&self),
        };
        selected.iter().filter_map(|scenario| scenario.walkthrough()).collect()
    }

    fn walkthrough(self) -> Option<fn() -> Result<&'static str>> {
        match self {
            Scenario::ReadUncommitted => Some(read_uncommitted),
            Scenario::ReadCommitted => Some(read_committed),
            Scenario::RepeatableRead => Some(repeatable_read),
            Scenario::Snapshot => Some(snapshot_write_write),
            Scenario::Serializable => Some(serializable_read_write),
            Scenario::All => None,
        }
    }

    /// Run the scenario (or all of them) and return one report line each.
    pub fn run(self) -> Result<Vec<String>> {
        self.walkthroughs()
            .into_iter()
            .map(|walkthrough| walkthrough().map(str::to_string))
            .collect()
    }
}

fn read_uncommitted() -> Result<&'static str> {
    let db = Database::new(IsolationLevel::ReadUncommitted);
    let mut c1 = db.create_session();
    let mut c2 = db.create_session();
    c1.begin()?;
    c2.begin()?;

    c1.set("x", "hey")?;
    ensure!(c1.get("x")? == "hey", "c1 should see its own write");
    ensure!(c2.get("x")? == "hey", "c2 should see c1's uncommitted write");

    ensure!(c1.delete("x")?.is_empty(), "c1 should delete x");
    ensure!(c1.get("x")? == NO_RECORD, "c1 should not see x after deleting it");
    ensure!(c2.get("x")? == NO_RECORD, "c2 should not see x once c1 deleted it");

    Ok("read uncommitted: uncommitted writes are visible, uncommitted deletes hide the record")
}

fn read_committed() -> Result<&'static str> {
    let db = Database::new(IsolationLevel::ReadCommitted);
    let mut c1 = db.create_session();
    let mut c2 = db.create_session();
    c1.begin()?;
    c2.begin()?;

    c1.set("x", "hey")?;
    ensure!(c1.get("x")? == "hey", "c1 should see its own write");
    ensure!(c2.get("x")? == NO_RECORD, "c2 should not see c1's uncommitted write");

    c1.commit()?;
    ensure!(c2.get("x")? == "hey", "c2 should see c1's write once committed");

    let mut c3 = db.create_session();
    c3.begin()?;
    c3.set("x", "yall")?;
    ensure!(c3.get("x")? == "yall", "c3 should see its own write");
    ensure!(c2.get("x")? == "hey", "c2 should not see c3's uncommitted write");

    c3.abort()?;
    ensure!(c2.get("x")? == "hey", "c2 should not see c3's aborted write");

    c2.delete("x")?;
    ensure!(c2.get("x")? == NO_RECORD, "c2 should not see x after deleting it");
    c2.commit()?;

    let mut c4 = db.create_session();
    c4.begin()?;
    ensure!(c4.get("x")? == NO_RECORD, "c4 should see c2's committed delete");

    Ok("read committed: only committed writes and deletes are visible")
}

fn repeatable_read() -> Result<&'static str> {
    let db = Database::new(IsolationLevel::RepeatableRead);
    let mut c1 = db.create_session();
    let mut c2 = db.create_session();
    c1.begin()?;
    c2.begin()?;

    c1.set("x", "hey")?;
    ensure!(c1.get("x")? == "hey", "c1 should see its own write");
    ensure!(c2.get("x")? == NO_RECORD, "c2 should not see c1's uncommitted write");

    c1.commit()?;
    ensure!(c2.get("x")? == NO_RECORD, "c2 should still not see x after c1 committed");

    let mut c3 = db.create_session();
    c3.begin()?;
    ensure!(c3.get("x")? == "hey", "c3 began after c1 committed and should see x");

    c3.set("x", "yall")?;
    ensure!(c3.get("x")? == "yall", "c3 should see its own write");
    ensure!(c2.get("x")? != "yall", "c2 should not see c3's write");

    c3.abort()?;
    ensure!(c2.get("x")? == NO_RECORD, "c2 should still not see x");

    let mut c4 = db.create_session();
    c4.begin()?;
    ensure!(c4.get("x")? == "hey", "c4 should see c1's write, not c3's aborted one");
    c4.delete("x")?;
    c4.commit()?;

    let mut c5 = db.create_session();
    c5.begin()?;
    ensure!(c5.get("x")? == NO_RECORD, "c5 should see c4's committed delete");

    Ok("repeatable read: commits after begin stay invisible for the whole transaction")
}

fn snapshot_write_write() -> Result<&'static str> {
    let db = Database::new(IsolationLevel::Snapshot);
    let mut c1 = db.create_session();
    let mut c2 = db.create_session();
    let mut c3 = db.create_session();
    c1.begin()?;
    c2.begin()?;
    c3.begin()?;

    c1.set("x", "hey")?;
    c2.set("x", "hey")?;

    ensure!(c1.commit()?.is_empty(), "c1 should commit");
    ensure!(
        c2.commit()? == "write-write conflict",
        "c2 should hit a write-write conflict"
    );

    c3.set("y", "hey")?;
    ensure!(c3.commit()?.is_empty(), "c3 wrote a disjoint key and should commit");

    Ok("snapshot: concurrent writes to one key conflict at commit")
}

fn serializable_read_write() -> Result<&'static str> {
    let db = Database::new(IsolationLevel::Serializable);
    let mut c1 = db.create_session();
    let mut c2 = db.create_session();
    let mut c3 = db.create_session();
    c1.begin()?;
    c2.begin()?;
    c3.begin()?;

    c1.set("x", "hey")?;
    c1.commit()?;
    ensure!(c2.get("x")? == NO_RECORD, "c2 should not see c1's write");
    ensure!(
        c2.commit()? == "read-write conflict",
        "c2 read x which c1 wrote and committed after c2 began"
    );

    c3.set("y", "hey")?;
    ensure!(c3.commit()?.is_empty(), "c3 touched an unrelated key and should commit");

    Ok("serializable: reading a key an overlapping transaction wrote conflicts at commit")
}
