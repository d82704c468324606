//! Deterministic synthetic commit-stream generation for the pipeline
//! benchmark: an in-memory commit history built from a seeded PRNG so
//! benchmark runs are reproducible across machines.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};

use history_core::ids::Hash;
use history_core::model::{Commit, Signature};
use history_engine::InMemoryRepo;

const LANGUAGES: &[&str] = &["rs", "go", "py", "js", "ts", "java", "rb"];
const AUTHOR_POOL: usize = 12;
const FILE_POOL: usize = 64;

#[derive(Clone, Copy, Debug)]
pub enum FixtureSize {
    Micro,
    Small,
    Medium,
    Large,
}

impl FixtureSize {
    pub fn commit_count(self) -> usize {
        match self {
            FixtureSize::Micro => 50,
            FixtureSize::Small => 500,
            FixtureSize::Medium => 5_000,
            FixtureSize::Large => 20_000,
        }
    }
}

/// xorshift64*, seeded per fixture: deterministic and dependency-free.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn range(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

pub struct SyntheticCommit {
    hash: Hash,
    parents: Vec<Hash>,
    sig: Signature,
}

impl Commit for SyntheticCommit {
    fn hash(&self) -> Hash {
        self.hash
    }
    fn parents(&self) -> &[Hash] {
        &self.parents
    }
    fn author_signature(&self) -> &Signature {
        &self.sig
    }
    fn message(&self) -> &str {
        ""
    }
}

pub struct GeneratedFixture {
    pub repo: InMemoryRepo,
    pub commits: Vec<SyntheticCommit>,
    pub total_lines: usize,
    pub total_bytes: usize,
}

fn hash_of(i: u64) -> Hash {
    let mut bytes = [0u8; 20];
    bytes[..8].copy_from_slice(&i.to_le_bytes());
    Hash::from_bytes(bytes)
}

/// Builds a linear commit chain of `size.commit_count()` commits, each
/// touching one file out of a rotating pool, with an occasional
/// (roughly 3%) merge commit joining the previous two commits so the
/// merge-tracker path gets exercised under load.
pub fn generate_fixture(size: FixtureSize, seed: u64) -> GeneratedFixture {
    let mut rng = Rng(seed | 1);
    let mut repo = InMemoryRepo::new();
    let mut commits = Vec::with_capacity(size.commit_count());
    let mut total_lines = 0usize;
    let mut total_bytes = 0usize;
    let epoch = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

    let mut prev_hash: Option<Hash> = None;
    for i in 0..size.commit_count() as u64 {
        let hash = hash_of(i + 1);
        let is_merge = i > 1 && rng.range(32) == 0;
        let parents = if is_merge {
            vec![hash_of(i), hash_of(i.saturating_sub(1))]
        } else if let Some(p) = prev_hash {
            vec![p]
        } else {
            vec![]
        };

        let file_index = rng.range(FILE_POOL);
        let lang = LANGUAGES[file_index % LANGUAGES.len()];
        let path = PathBuf::from(format!("module_{file_index}/file_{file_index}.{lang}"));
        let blob_hash = hash_of(1_000_000 + i);
        let line_count = 5 + rng.range(40);
        let content: String = (0..line_count).map(|l| format!("line {l} in commit {i}\n")).collect();
        total_lines += line_count;
        total_bytes += content.len();

        repo.put_tree(hash, vec![(path, blob_hash)]);
        repo.put_blob(blob_hash, content.into_bytes());

        let author = rng.range(AUTHOR_POOL);
        commits.push(SyntheticCommit {
            hash,
            parents,
            sig: Signature {
                name: format!("dev-{author}"),
                email: format!("dev-{author}@example.com"),
                when: epoch + chrono::Duration::hours(i as i64),
            },
        });

        prev_hash = Some(hash);
    }

    GeneratedFixture {
        repo,
        commits,
        total_lines,
        total_bytes,
    }
}

pub fn commit_refs(fixture: &GeneratedFixture) -> Vec<&dyn Commit> {
    fixture.commits.iter().map(|c| c as &dyn Commit).collect()
}

pub fn shared_repo(fixture: GeneratedFixture) -> (Arc<InMemoryRepo>, Vec<SyntheticCommit>) {
    (Arc::new(fixture.repo), fixture.commits)
}
