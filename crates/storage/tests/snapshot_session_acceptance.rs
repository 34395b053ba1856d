use shared::domain::{AnomalyEntry, DashboardSnapshot, RiskLevel};
use storage::{
    clear_snapshot, load_snapshot, save_snapshot, SessionStore, SnapshotLoad, SqliteSessionStore,
    ANALYSIS_COMPLETE_KEY, IN_MEMORY_SESSION_URL,
};

#[tokio::test]
async fn dashboard_snapshot_survives_in_session_database() {
    let store = SqliteSessionStore::new(IN_MEMORY_SESSION_URL)
        .await
        .expect("db");

    let snapshot = DashboardSnapshot {
        risk_score: 72.0,
        risk_label: "Medium Risk".to_string(),
        compliance_pct: 87.5,
        document_counts: Vec::new(),
        anomalies: vec![AnomalyEntry {
            title: "Duplicate vendor payment".to_string(),
            description: "Two payments with identical amounts".to_string(),
            severity: RiskLevel::High,
            detected_at: "2024-06-02".to_string(),
        }],
        has_analysis: true,
    };

    save_snapshot(&store, &snapshot).await.expect("save");
    let loaded = load_snapshot(&store).await.expect("load");
    assert_eq!(loaded, SnapshotLoad::Found(snapshot));

    clear_snapshot(&store).await.expect("clear");
    assert_eq!(store.get(ANALYSIS_COMPLETE_KEY).await.expect("get"), None);
    assert_eq!(load_snapshot(&store).await.expect("load"), SnapshotLoad::Absent);
}
