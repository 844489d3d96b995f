//! Username <-> account bijection
//!
//! Both directions of the mapping live behind one type whose mutators always
//! update them together, so they cannot drift apart.

use crate::types::{AccountId, Registration, Username};
use std::collections::HashMap;

/// Why a paired insert was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// The username already has an owner
    UsernameTaken,
    /// The account already owns a username
    AccountTaken,
}

/// Bijective map between normalized usernames and accounts
///
/// Each entry carries its full [`Registration`]. At most one account owns a
/// username and at most one username belongs to an account.
#[derive(Debug, Default)]
pub struct UsernameBiMap {
    by_username: HashMap<Username, Registration>,
    by_account: HashMap<AccountId, Username>,
}

impl UsernameBiMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered usernames
    pub fn len(&self) -> usize {
        self.by_username.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_username.is_empty()
    }

    pub fn get_by_username(&self, username: &Username) -> Option<&Registration> {
        self.by_username.get(username)
    }

    pub fn get_by_account(&self, account: &AccountId) -> Option<&Registration> {
        self.by_account
            .get(account)
            .and_then(|username| self.by_username.get(username))
    }

    pub fn contains_username(&self, username: &Username) -> bool {
        self.by_username.contains_key(username)
    }

    pub fn contains_account(&self, account: &AccountId) -> bool {
        self.by_account.contains_key(account)
    }

    /// Insert a registration into both directions
    ///
    /// Nothing is written if either side is already occupied.
    pub fn insert(&mut self, registration: Registration) -> Result<(), Conflict> {
        if self.by_username.contains_key(&registration.username) {
            return Err(Conflict::UsernameTaken);
        }
        if self.by_account.contains_key(&registration.owner) {
            return Err(Conflict::AccountTaken);
        }

        self.by_account
            .insert(registration.owner, registration.username.clone());
        self.by_username
            .insert(registration.username.clone(), registration);
        Ok(())
    }

    /// Remove an account's registration from both directions
    pub fn remove_by_account(&mut self, account: &AccountId) -> Option<Registration> {
        let username = self.by_account.remove(account)?;
        self.by_username.remove(&username)
    }

    /// Give `owner` a new username, freeing the old one
    ///
    /// Returns the previous registration. The premium flag carries over.
    pub fn rename(
        &mut self,
        owner: &AccountId,
        new_username: Username,
    ) -> Result<Option<Registration>, Conflict> {
        if self.by_username.contains_key(&new_username) {
            return Err(Conflict::UsernameTaken);
        }
        let Some(previous) = self.remove_by_account(owner) else {
            return Ok(None);
        };

        let renamed = Registration {
            username: new_username,
            owner: *owner,
            premium: previous.premium,
        };
        // Both sides were just checked/freed, so this cannot conflict
        self.insert(renamed)?;
        Ok(Some(previous))
    }

    /// Move `from`'s registration to `to`, keeping username and premium flag
    pub fn reassign(
        &mut self,
        from: &AccountId,
        to: AccountId,
    ) -> Result<Option<Registration>, Conflict> {
        if self.by_account.contains_key(&to) {
            return Err(Conflict::AccountTaken);
        }
        let Some(mut registration) = self.remove_by_account(from) else {
            return Ok(None);
        };

        registration.owner = to;
        self.insert(registration.clone())?;
        Ok(Some(registration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(n: u64) -> AccountId {
        AccountId::from_low_u64(n)
    }

    fn reg(name: &str, owner: u64, premium: bool) -> Registration {
        Registration {
            username: Username::parse(name).unwrap(),
            owner: acct(owner),
            premium,
        }
    }

    fn assert_consistent(map: &UsernameBiMap) {
        assert_eq!(map.by_username.len(), map.by_account.len());
        for (account, username) in &map.by_account {
            assert_eq!(map.by_username[username].owner, *account);
        }
    }

    #[test]
    fn test_insert_and_lookup_both_directions() {
        let mut map = UsernameBiMap::new();
        map.insert(reg("alice", 1, false)).unwrap();

        let name = Username::parse("ALICE").unwrap();
        assert_eq!(map.get_by_username(&name).unwrap().owner, acct(1));
        assert_eq!(map.get_by_account(&acct(1)).unwrap().username, name);
        assert_consistent(&map);
    }

    #[test]
    fn test_insert_conflicts_write_nothing() {
        let mut map = UsernameBiMap::new();
        map.insert(reg("alice", 1, false)).unwrap();

        assert_eq!(map.insert(reg("Alice", 2, false)), Err(Conflict::UsernameTaken));
        assert_eq!(map.insert(reg("bob", 1, false)), Err(Conflict::AccountTaken));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_account(&acct(2)));
        assert_consistent(&map);
    }

    #[test]
    fn test_rename_frees_old_username() {
        let mut map = UsernameBiMap::new();
        map.insert(reg("alice", 1, false)).unwrap();

        let previous = map
            .rename(&acct(1), Username::parse("alicia").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(previous.username.as_str(), "alice");
        assert!(!map.contains_username(&Username::parse("alice").unwrap()));
        assert_eq!(
            map.get_by_account(&acct(1)).unwrap().username.as_str(),
            "alicia"
        );
        assert_consistent(&map);
    }

    #[test]
    fn test_rename_to_taken_name_is_noop() {
        let mut map = UsernameBiMap::new();
        map.insert(reg("alice", 1, false)).unwrap();
        map.insert(reg("bob", 2, false)).unwrap();

        assert_eq!(
            map.rename(&acct(1), Username::parse("BOB").unwrap()),
            Err(Conflict::UsernameTaken)
        );
        assert_eq!(map.get_by_account(&acct(1)).unwrap().username.as_str(), "alice");
        assert_consistent(&map);
    }

    #[test]
    fn test_reassign_keeps_premium_flag() {
        let mut map = UsernameBiMap::new();
        map.insert(reg("vip", 1, true)).unwrap();

        let moved = map.reassign(&acct(1), acct(2)).unwrap().unwrap();
        assert!(moved.premium);
        assert_eq!(moved.owner, acct(2));
        assert!(!map.contains_account(&acct(1)));
        assert_consistent(&map);
    }

    #[test]
    fn test_reassign_to_registered_account_refused() {
        let mut map = UsernameBiMap::new();
        map.insert(reg("alice", 1, false)).unwrap();
        map.insert(reg("bob", 2, false)).unwrap();

        assert_eq!(map.reassign(&acct(1), acct(2)), Err(Conflict::AccountTaken));
        assert_consistent(&map);
    }

    #[test]
    fn test_missing_owner_returns_none() {
        let mut map = UsernameBiMap::new();
        assert_eq!(map.rename(&acct(1), Username::parse("x").unwrap()), Ok(None));
        assert_eq!(map.reassign(&acct(1), acct(2)), Ok(None));
        assert!(map.remove_by_account(&acct(1)).is_none());
    }
}
