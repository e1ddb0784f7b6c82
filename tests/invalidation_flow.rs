//! End-to-end invalidation scenarios against a recording store.
//!
//! Exercises the full pipeline (direct keys → cascade expansion → one
//! deduplicated batch) the way the mutation-triggering services drive it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use squadra_cache::cache::{CacheInvalidator, CacheStore, CacheStoreError, InvalidationError};
use squadra_cache::domain::{Association, TeamSnapshot, UserSnapshot};

#[derive(Default)]
struct RecordingStore {
    batches: Mutex<Vec<(String, Vec<String>)>>,
    patterns: Mutex<Vec<(String, String)>>,
}

impl RecordingStore {
    fn batches(&self) -> Vec<(String, Vec<String>)> {
        self.batches.lock().expect("batches lock").clone()
    }

    fn patterns(&self) -> Vec<(String, String)> {
        self.patterns.lock().expect("patterns lock").clone()
    }

    fn single_batch(&self) -> (String, Vec<String>) {
        let batches = self.batches();
        assert_eq!(batches.len(), 1, "expected exactly one batch submission");
        batches.into_iter().next().expect("one batch")
    }
}

#[async_trait]
impl CacheStore for RecordingStore {
    async fn invalidate_batch(
        &self,
        keys: &[String],
        operation: &str,
    ) -> Result<(), CacheStoreError> {
        self.batches
            .lock()
            .expect("batches lock")
            .push((operation.to_string(), keys.to_vec()));
        Ok(())
    }

    async fn invalidate_pattern(
        &self,
        pattern: &str,
        operation: &str,
    ) -> Result<(), CacheStoreError> {
        self.patterns
            .lock()
            .expect("patterns lock")
            .push((operation.to_string(), pattern.to_string()));
        Ok(())
    }

    fn supports_patterns(&self) -> bool {
        true
    }
}

/// Accepts batch submissions but fails every pattern sweep.
struct PatternFailingStore {
    batches: Mutex<Vec<(String, Vec<String>)>>,
}

#[async_trait]
impl CacheStore for PatternFailingStore {
    async fn invalidate_batch(
        &self,
        keys: &[String],
        operation: &str,
    ) -> Result<(), CacheStoreError> {
        self.batches
            .lock()
            .expect("batches lock")
            .push((operation.to_string(), keys.to_vec()));
        Ok(())
    }

    async fn invalidate_pattern(
        &self,
        _pattern: &str,
        _operation: &str,
    ) -> Result<(), CacheStoreError> {
        Err(CacheStoreError::Backend("scan aborted".into()))
    }

    fn supports_patterns(&self) -> bool {
        true
    }
}

struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn invalidate_batch(
        &self,
        _keys: &[String],
        _operation: &str,
    ) -> Result<(), CacheStoreError> {
        Err(CacheStoreError::Unavailable("store down".into()))
    }

    async fn invalidate_pattern(
        &self,
        _pattern: &str,
        _operation: &str,
    ) -> Result<(), CacheStoreError> {
        Err(CacheStoreError::Unavailable("store down".into()))
    }
}

fn invalidator() -> (Arc<RecordingStore>, CacheInvalidator) {
    let store = Arc::new(RecordingStore::default());
    let invalidator = CacheInvalidator::new(store.clone());
    (store, invalidator)
}

#[tokio::test]
async fn team_creation_submits_the_seven_expected_keys_once() {
    let (store, invalidator) = invalidator();
    let mut team = TeamSnapshot::new("t1", "o@x");
    team.school_year_id = Some("sy1".into());
    team.school_type_id = Some("st1".into());

    invalidator
        .on_team_created(&team)
        .await
        .expect("creation submits");

    let (label, keys) = store.single_batch();
    assert_eq!(label, "Team.Created:t1");
    assert_eq!(keys.len(), 7);
    for expected in [
        "Teams_AllActive",
        "Teams_Active",
        "Teams_ByOwner_o@x",
        "Team_Id_t1",
        "Teams_BySchoolYear_sy1",
        "Teams_BySchoolType_st1",
        "Teams_ExternalIds",
    ] {
        assert!(keys.contains(&expected.to_string()), "missing key {expected}");
    }
}

#[tokio::test]
async fn bulk_membership_change_is_one_call_with_five_keys() {
    let (store, invalidator) = invalidator();
    let user_ids = vec!["u1".to_string(), "u2".to_string(), "u3".to_string()];

    invalidator
        .on_team_members_bulk_changed("t1", &user_ids)
        .await
        .expect("bulk change submits");

    let (label, keys) = store.single_batch();
    assert_eq!(label, "Team.MembersBulkChanged:t1");
    assert_eq!(
        keys,
        vec![
            "Team_Members_t1",
            "Team_Id_t1",
            "User_Teams_u1",
            "User_Teams_u2",
            "User_Teams_u3",
        ]
    );
}

#[tokio::test]
async fn composite_batch_deduplicates_across_sub_operations() {
    let (store, invalidator) = invalidator();
    let mut operations = BTreeMap::new();
    operations.insert(
        "Op1".to_string(),
        vec!["K1".to_string(), "K2".to_string(), "K3".to_string()],
    );
    operations.insert("Op2".to_string(), vec!["K4".to_string(), "K5".to_string()]);
    operations.insert("Op3".to_string(), vec!["K6".to_string(), "K2".to_string()]);

    invalidator
        .invalidate_composite(&operations)
        .await
        .expect("composite submits");

    let (label, keys) = store.single_batch();
    assert_eq!(label, "Op1+Op2+Op3");
    assert_eq!(keys.len(), 6);
    for expected in ["K1", "K2", "K3", "K4", "K5", "K6"] {
        assert!(keys.contains(&expected.to_string()));
    }
}

#[tokio::test]
async fn owner_only_update_leaves_other_partitions_alone() {
    let (store, invalidator) = invalidator();
    let mut old = TeamSnapshot::new("t1", "old@x");
    old.school_year_id = Some("sy1".into());
    old.school_type_id = Some("st1".into());
    let mut new = old.clone();
    new.owner_upn = "new@x".into();

    invalidator
        .on_team_updated(&new, &old)
        .await
        .expect("update submits");

    let (_, keys) = store.single_batch();
    assert!(keys.contains(&"Teams_ByOwner_old@x".to_string()));
    assert!(keys.contains(&"Teams_ByOwner_new@x".to_string()));
    assert!(!keys.iter().any(|k| k.starts_with("Teams_BySchoolYear")));
    assert!(!keys.iter().any(|k| k.starts_with("Teams_BySchoolType")));
    assert!(!keys.contains(&"Teams_Archived".to_string()));
}

#[tokio::test]
async fn role_only_update_still_invalidates_the_active_user_list() {
    let (store, invalidator) = invalidator();
    let mut old = UserSnapshot::new("u1", "u1@school.example");
    old.role = Some("Teacher".into());
    let mut new = old.clone();
    new.role = Some("HeadTeacher".into());

    invalidator
        .on_user_updated(&new, &old)
        .await
        .expect("update submits");

    let (label, keys) = store.single_batch();
    assert_eq!(label, "User.Updated:u1");
    assert!(
        keys.contains(&"Users_AllActive".to_string()),
        "active-user list must be invalidated on every user update"
    );
    assert!(keys.contains(&"Users_ByRole_Teacher".to_string()));
    assert!(keys.contains(&"Users_ByRole_HeadTeacher".to_string()));
}

#[tokio::test]
async fn deactivation_cascades_over_active_memberships_only() {
    let (store, invalidator) = invalidator();
    let mut user = UserSnapshot::new("u1", "u1@school.example");
    user.department_id = Some("d1".into());
    user.teams = vec![Association::active("t1"), Association::inactive("t2")];
    user.subjects = vec![Association::active("s1")];

    invalidator
        .on_user_deactivated(&user)
        .await
        .expect("deactivation submits");

    let (label, keys) = store.single_batch();
    assert_eq!(label, "User.Deactivated:u1");
    assert!(keys.contains(&"Department_Users_d1".to_string()));
    assert!(keys.contains(&"User_Teams_u1".to_string()));
    assert!(keys.contains(&"User_Subjects_u1".to_string()));
    assert!(keys.contains(&"Subject_Teachers_s1".to_string()));
    assert!(keys.contains(&"Team_Members_t1".to_string()));
    assert!(
        !keys.contains(&"Team_Members_t2".to_string()),
        "inactive membership must not cascade"
    );
}

#[tokio::test]
async fn status_transition_invalidates_both_list_partitions() {
    let (store, invalidator) = invalidator();
    let team = TeamSnapshot::new("t1", "o@x");

    invalidator
        .on_team_archived(&team)
        .await
        .expect("archive submits");
    invalidator
        .on_team_restored(&team)
        .await
        .expect("restore submits");

    for (_, keys) in store.batches() {
        assert!(keys.contains(&"Teams_Active".to_string()));
        assert!(keys.contains(&"Teams_Archived".to_string()));
    }
}

#[tokio::test]
async fn team_deletion_adds_a_wildcard_sweep() {
    let (store, invalidator) = invalidator();
    let mut team = TeamSnapshot::new("t1", "o@x");
    team.members = vec![Association::active("u1")];

    invalidator
        .on_team_deleted(&team)
        .await
        .expect("deletion submits");

    let (label, keys) = store.single_batch();
    assert_eq!(label, "Team.Deleted:t1");
    assert!(keys.contains(&"Team_Members_t1".to_string()));
    assert!(keys.contains(&"User_Teams_u1".to_string()));
    assert_eq!(
        store.patterns(),
        vec![("Team.Deleted:t1".to_string(), "*Team*t1*".to_string())]
    );
}

#[tokio::test]
async fn pattern_sweep_failure_propagates_after_a_successful_batch() {
    let store = Arc::new(PatternFailingStore {
        batches: Mutex::new(Vec::new()),
    });
    let invalidator = CacheInvalidator::new(store.clone());
    let team = TeamSnapshot::new("t1", "o@x");

    let error = invalidator
        .on_team_deleted(&team)
        .await
        .expect_err("pattern failure must surface");

    assert!(matches!(
        error,
        InvalidationError::Store(CacheStoreError::Backend(_))
    ));
    // The explicit batch was already submitted before the sweep failed.
    let batches = store.batches.lock().expect("batches lock");
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].0, "Team.Deleted:t1");
}

#[tokio::test]
async fn store_failure_propagates_to_the_caller() {
    let invalidator = CacheInvalidator::new(Arc::new(FailingStore));
    let team = TeamSnapshot::new("t1", "o@x");

    let error = invalidator
        .on_team_created(&team)
        .await
        .expect_err("store failure must surface");
    assert!(matches!(
        error,
        InvalidationError::Store(CacheStoreError::Unavailable(_))
    ));
}

#[tokio::test]
async fn repeated_calls_submit_identical_batches() {
    let (store, invalidator) = invalidator();
    let mut team = TeamSnapshot::new("t1", "o@x");
    team.school_year_id = Some("sy1".into());

    invalidator
        .on_team_created(&team)
        .await
        .expect("first call submits");
    invalidator
        .on_team_created(&team)
        .await
        .expect("second call submits");

    let batches = store.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], batches[1], "key derivation must be deterministic");
}
