//! End-to-end properties of the reference graph, tag registry, and
//! moderation flow, exercised through the public service API.

use std::collections::HashSet;
use std::sync::Arc;

use gloss_config::DatabaseConfig;
use gloss_core::entities::Submitter;
use gloss_core::enums::{EntryType, SubmissionStatus};
use gloss_core::payload::{EntryDraft, SubmissionPayload};
use gloss_db::GlossDb;
use gloss_db::error::DatabaseError;
use gloss_db::repos::reference::{outgoing_targets, resolve_mentions};
use gloss_db::service::GlossService;
use gloss_db::updates::entry::EntryChangeSetBuilder;
use pretty_assertions::assert_eq;

async fn memory_service() -> GlossService {
    GlossService::new_local(":memory:").await.unwrap()
}

async fn edges_from(svc: &GlossService, id: &str) -> Vec<String> {
    let conn = svc.db().acquire().await.unwrap();
    outgoing_targets(&conn, id).await.unwrap()
}

async fn edge_count_touching(svc: &GlossService, id: &str) -> i64 {
    let conn = svc.db().acquire().await.unwrap();
    let mut rows = conn
        .query(
            "SELECT count(*) FROM entry_references WHERE source_entry_id = ?1 OR target_entry_id = ?1",
            [id],
        )
        .await
        .unwrap();
    rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
}

/// Edges and cache both equal a fresh resolution of the description.
async fn assert_graph_matches_description(svc: &GlossService, id: &str) {
    let detail = svc.get_entry(id).await.unwrap().unwrap();
    let conn = svc.db().acquire().await.unwrap();
    let expected: Vec<String> = resolve_mentions(&conn, &detail.entry.description, None)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.target_id)
        .filter(|t| t != id)
        .collect();
    drop(conn);

    let edges: HashSet<String> = edges_from(svc, id).await.into_iter().collect();
    let cache: HashSet<String> = detail.entry.mentioned_entries.iter().cloned().collect();
    let expected: HashSet<String> = expected.into_iter().collect();
    assert_eq!(edges, expected, "edges of {id}");
    assert_eq!(cache, expected, "cache of {id}");
}

async fn approve_new(svc: &GlossService, draft: EntryDraft) -> String {
    let sub = svc
        .create_submission(&SubmissionPayload::New(draft), &Submitter::default())
        .await
        .unwrap();
    svc.approve_submission(&sub.id, None).await.unwrap().entry.id
}

#[tokio::test]
async fn unknown_mentions_stay_text() {
    let svc = memory_service().await;
    let burpees = svc
        .create_entry(&EntryDraft::new("Burpees", EntryType::Exercise))
        .await
        .unwrap();

    let hello = svc
        .create_entry(
            &EntryDraft::new("Warmup", EntryType::Term).description("Hello @Burpees and @Unknown"),
        )
        .await
        .unwrap();

    assert_eq!(hello.mentioned_entries, vec![burpees.id.clone()]);
    assert_eq!(edges_from(&svc, &hello.id).await, vec![burpees.id.clone()]);
    assert_eq!(hello.description, "Hello @Burpees and @Unknown");
}

#[tokio::test]
async fn every_save_path_keeps_graph_in_sync() {
    let svc = memory_service().await;
    let plank = svc
        .create_entry(&EntryDraft::new("Plank", EntryType::Exercise))
        .await
        .unwrap();
    let squat = approve_new(&svc, EntryDraft::new("Squat", EntryType::Exercise)).await;

    // Direct create, including a self-mention.
    let flow = svc
        .create_entry(
            &EntryDraft::new("Flow", EntryType::Term).description("@Flow: @Plank then @squat"),
        )
        .await
        .unwrap();
    assert_graph_matches_description(&svc, &flow.id).await;
    assert!(!flow.mentioned_entries.contains(&flow.id));
    assert_eq!(flow.mentioned_entries, vec![plank.id.clone(), squat.clone()]);

    // Direct update.
    svc.update_entry(
        &flow.id,
        &EntryDraft::new("Flow", EntryType::Term).description("just @Squat"),
    )
    .await
    .unwrap();
    assert_graph_matches_description(&svc, &flow.id).await;

    // Approved edit.
    let edit = EntryChangeSetBuilder::new()
        .description("@Plank only")
        .for_entry(&flow.id);
    let sub = svc
        .create_submission(&SubmissionPayload::Edit(edit), &Submitter::default())
        .await
        .unwrap();
    svc.approve_submission(&sub.id, None).await.unwrap();
    assert_graph_matches_description(&svc, &flow.id).await;
    assert_eq!(edges_from(&svc, &flow.id).await, vec![plank.id]);
}

#[tokio::test]
async fn delete_removes_every_edge() {
    let svc = memory_service().await;
    let a = svc
        .create_entry(&EntryDraft::new("Alpha", EntryType::Term))
        .await
        .unwrap();
    let b = svc
        .create_entry(&EntryDraft::new("Beta", EntryType::Term).description("after @Alpha"))
        .await
        .unwrap();
    svc.update_entry(
        &a.id,
        &EntryDraft::new("Alpha", EntryType::Term).description("before @Beta"),
    )
    .await
    .unwrap();
    assert_eq!(edge_count_touching(&svc, &a.id).await, 2);

    svc.delete_entry(&a.id).await.unwrap();

    assert_eq!(edge_count_touching(&svc, &a.id).await, 0);
    assert!(svc.get_entry(&a.id).await.unwrap().is_none());
    let b = svc.get_entry(&b.id).await.unwrap().unwrap();
    assert!(b.entry.mentioned_entries.is_empty());
}

#[tokio::test]
async fn shared_new_tag_is_one_row() {
    let svc = memory_service().await;
    let a = svc
        .create_entry(&EntryDraft::new("Kettlebell Swing", EntryType::Exercise).tags(["posterior"]))
        .await
        .unwrap();
    let b = svc
        .create_entry(&EntryDraft::new("Good Morning", EntryType::Exercise).tags(["posterior"]))
        .await
        .unwrap();

    assert_eq!(a.tags, b.tags);
    let tags = svc.list_tags().await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].entry_count, 2);
}

#[tokio::test]
async fn description_only_edit_keeps_other_fields() {
    let svc = memory_service().await;
    svc.create_entry(&EntryDraft::new("Plank", EntryType::Exercise))
        .await
        .unwrap();
    let original = svc
        .create_entry(
            &EntryDraft::new("Side Plank", EntryType::Exercise)
                .description("Like @Plank, sideways")
                .aliases(["Lateral plank"])
                .tags(["core", "isometric"])
                .video_link("https://video.example/side-plank"),
        )
        .await
        .unwrap();

    let edit = EntryChangeSetBuilder::new().description("X").for_entry(&original.id);
    let sub = svc
        .create_submission(&SubmissionPayload::Edit(edit), &Submitter::default())
        .await
        .unwrap();
    let updated = svc.approve_submission(&sub.id, None).await.unwrap().entry;

    assert_eq!(updated.description, "X");
    assert_eq!(updated.name, original.name);
    assert_eq!(updated.entry_type, original.entry_type);
    assert_eq!(updated.aliases, original.aliases);
    assert_eq!(updated.tags, original.tags);
    assert_eq!(updated.video_link, original.video_link);
    assert!(updated.mentioned_entries.is_empty(), "X mentions nothing");
}

#[tokio::test]
async fn unrelated_edit_keeps_explicit_mentions() {
    let svc = memory_service().await;
    let amrap = svc
        .create_entry(&EntryDraft::new("AMRAP", EntryType::Term))
        .await
        .unwrap();
    let picked = svc
        .create_entry(
            &EntryDraft::new("Metcon", EntryType::Term)
                .description("See the AMRAP page")
                .mentions(vec![amrap.id.clone()]),
        )
        .await
        .unwrap();
    assert_eq!(picked.mentioned_entries, vec![amrap.id.clone()]);

    let edit = EntryChangeSetBuilder::new()
        .aliases(vec!["Conditioning".into()])
        .for_entry(&picked.id);
    let sub = svc
        .create_submission(&SubmissionPayload::Edit(edit), &Submitter::default())
        .await
        .unwrap();
    let updated = svc.approve_submission(&sub.id, None).await.unwrap().entry;
    assert_eq!(updated.mentioned_entries, vec![amrap.id]);
}

#[tokio::test]
async fn rejection_never_touches_entries() {
    let svc = memory_service().await;
    let entry = svc
        .create_entry(&EntryDraft::new("Lunge", EntryType::Exercise).description("Step forward"))
        .await
        .unwrap();

    let edit = EntryChangeSetBuilder::new()
        .name("Reverse Lunge")
        .description("Step back")
        .for_entry(&entry.id);
    let sub = svc
        .create_submission(&SubmissionPayload::Edit(edit), &Submitter::default())
        .await
        .unwrap();
    let rejected = svc.reject_submission(&sub.id, Some("keep it")).await.unwrap();
    assert_eq!(rejected.status, SubmissionStatus::Rejected);

    let after = svc.get_entry(&entry.id).await.unwrap().unwrap().entry;
    assert_eq!(after, entry);
}

#[tokio::test]
async fn removing_mentions_clears_graph() {
    let svc = memory_service().await;
    svc.create_entry(&EntryDraft::new("Tabata", EntryType::Term))
        .await
        .unwrap();
    let hiit = svc
        .create_entry(&EntryDraft::new("HIIT", EntryType::Term).description("e.g. @Tabata"))
        .await
        .unwrap();
    assert_eq!(hiit.mentioned_entries.len(), 1);

    let updated = svc
        .update_entry(
            &hiit.id,
            &EntryDraft::new("HIIT", EntryType::Term).description("high intensity intervals"),
        )
        .await
        .unwrap();
    assert!(updated.mentioned_entries.is_empty());
    assert!(edges_from(&svc, &hiit.id).await.is_empty());
}

#[tokio::test]
async fn second_approval_fails_and_failed_approval_keeps_pending() {
    let svc = memory_service().await;
    let sub = svc
        .create_submission(
            &SubmissionPayload::New(EntryDraft::new("Thruster", EntryType::Exercise)),
            &Submitter::default(),
        )
        .await
        .unwrap();
    svc.approve_submission(&sub.id, None).await.unwrap();

    let err = svc.approve_submission(&sub.id, None).await.unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidTransition { .. }), "got {err:?}");

    // A new-entry submission whose id collides fails inside the transaction.
    let taken = svc.list_entries(&Default::default()).await.unwrap()[0].id.clone();
    let mut draft = EntryDraft::new("Thruster", EntryType::Exercise);
    draft.id = Some(taken);
    let clash = svc
        .create_submission(&SubmissionPayload::New(draft), &Submitter::default())
        .await
        .unwrap();
    let err = svc.approve_submission(&clash.id, None).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)), "got {err:?}");
    assert_eq!(
        svc.get_submission(&clash.id).await.unwrap().status,
        SubmissionStatus::Pending
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tag_creation_from_separate_transactions() {
    let dir = tempfile::tempdir().unwrap();
    let db = GlossDb::open(&DatabaseConfig {
        path: dir.path().join("tags.db").to_string_lossy().into_owned(),
        pool_size: 2,
        busy_timeout_ms: 5_000,
    })
    .await
    .unwrap();
    let svc = Arc::new(GlossService::from_db(db));
    assert_eq!(svc.db().pool_size(), 2);

    let spawn = |svc: Arc<GlossService>| {
        tokio::spawn(async move { svc.ensure_tags(&["NewTag".to_string()]).await })
    };
    let (a, b) = tokio::join!(spawn(Arc::clone(&svc)), spawn(Arc::clone(&svc)));
    let a = a.unwrap().unwrap();
    let b = b.unwrap().unwrap();

    assert_eq!(a, b);
    let all = svc.list_tags().await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn pending_edit_conflict_is_last_writer_wins() {
    let svc = memory_service().await;
    let entry = svc
        .create_entry(&EntryDraft::new("Clean", EntryType::Exercise))
        .await
        .unwrap();

    let mut ids = Vec::new();
    for text in ["first", "second"] {
        let edit = EntryChangeSetBuilder::new().description(text).for_entry(&entry.id);
        ids.push(
            svc.create_submission(&SubmissionPayload::Edit(edit), &Submitter::default())
                .await
                .unwrap()
                .id,
        );
    }
    for id in &ids {
        svc.approve_submission(id, None).await.unwrap();
    }

    let after = svc.get_entry(&entry.id).await.unwrap().unwrap().entry;
    assert_eq!(after.description, "second");
}
