//! `IdentityDetector` plumbing provider: resolves a commit's author
//! signature to an [`AuthorId`], assigning a fresh id and appending to the
//! [`ReversedPeopleDict`] on first sighting (spec §4.1). Two signatures
//! collapse to the same identity when their normalized emails match, or
//! failing that when their normalized names match — the same two-pass
//! heuristic most mailmap-less history miners fall back on.

use history_core::ids::AuthorId;
use history_core::model::{Commit, ReversedPeopleDict};
use history_core::plumbing::IdentityProvider;
use history_core::types::FxHashMap;

pub struct MailmapIdentityProvider {
    people: ReversedPeopleDict,
    by_email: FxHashMap<String, AuthorId>,
    by_name: FxHashMap<String, AuthorId>,
    anonymize: bool,
}

impl MailmapIdentityProvider {
    pub fn new(anonymize: bool) -> Self {
        Self {
            people: ReversedPeopleDict::new(),
            by_email: FxHashMap::default(),
            by_name: FxHashMap::default(),
            anonymize,
        }
    }

    /// The dictionary accumulated so far; stable once the history has been
    /// fully consumed (spec §4.1, §4.5 for report use).
    pub fn people(&self) -> &ReversedPeopleDict {
        &self.people
    }

    pub fn into_people(self) -> ReversedPeopleDict {
        self.people
    }

    fn display_name(&self, normalized_name: &str, id: AuthorId) -> String {
        if self.anonymize {
            format!("Dev-{}", id.0)
        } else {
            normalized_name.to_string()
        }
    }
}

impl IdentityProvider for MailmapIdentityProvider {
    fn resolve(&mut self, commit: &dyn Commit) -> AuthorId {
        let sig = commit.author_signature();
        let email = normalize(&sig.email);
        let name = normalize(&sig.name);

        if !email.is_empty() {
            if let Some(&id) = self.by_email.get(&email) {
                self.by_name.entry(name).or_insert(id);
                return id;
            }
        }
        if let Some(&id) = self.by_name.get(&name) {
            if !email.is_empty() {
                self.by_email.insert(email, id);
            }
            return id;
        }

        let placeholder_id = AuthorId(self.people.len() as i32);
        let display = self.display_name(&name, placeholder_id);
        let id = self.people.push(display);
        if !email.is_empty() {
            self.by_email.insert(email, id);
        }
        self.by_name.insert(name, id);
        id
    }
}

fn normalize(field: &str) -> String {
    field.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use history_core::ids::Hash;
    use history_core::model::Signature;

    struct FakeCommit(Signature);

    impl Commit for FakeCommit {
        fn hash(&self) -> Hash {
            Hash::NONE
        }
        fn parents(&self) -> &[Hash] {
            &[]
        }
        fn author_signature(&self) -> &Signature {
            &self.0
        }
        fn message(&self) -> &str {
            ""
        }
    }

    fn sig(name: &str, email: &str) -> Signature {
        Signature {
            name: name.to_string(),
            email: email.to_string(),
            when: Utc::now(),
        }
    }

    #[test]
    fn same_email_collapses_to_one_identity() {
        let mut provider = MailmapIdentityProvider::new(false);
        let a = provider.resolve(&FakeCommit(sig("Alice", "alice@example.com")));
        let b = provider.resolve(&FakeCommit(sig("Alice W.", "Alice@Example.com")));
        assert_eq!(a, b);
        assert_eq!(provider.people().len(), 1);
    }

    #[test]
    fn distinct_authors_get_sequential_ids() {
        let mut provider = MailmapIdentityProvider::new(false);
        let a = provider.resolve(&FakeCommit(sig("Alice", "alice@example.com")));
        let b = provider.resolve(&FakeCommit(sig("Bob", "bob@example.com")));
        assert_eq!(a, AuthorId(0));
        assert_eq!(b, AuthorId(1));
    }

    #[test]
    fn anonymize_replaces_display_name() {
        let mut provider = MailmapIdentityProvider::new(true);
        let id = provider.resolve(&FakeCommit(sig("Alice", "alice@example.com")));
        assert_eq!(provider.people().get(id), Some("Dev-0"));
    }

    #[test]
    fn missing_email_falls_back_to_normalized_name() {
        let mut provider = MailmapIdentityProvider::new(false);
        let a = provider.resolve(&FakeCommit(sig("Alice", "")));
        let b = provider.resolve(&FakeCommit(sig("alice", "")));
        assert_eq!(a, b);
    }
}
