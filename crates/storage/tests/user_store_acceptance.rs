use storage::Storage;

#[tokio::test]
async fn seeded_admin_survives_reopen() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("users.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    {
        let storage = Storage::new(&database_url).await.expect("db");
        storage
            .create_user("admin", "admin123", "admin")
            .await
            .expect("seed admin");
    }

    let storage = Storage::new(&database_url).await.expect("reopen");
    let admin = storage
        .verify_credentials("admin", "admin123")
        .await
        .expect("verify")
        .expect("admin present");
    assert_eq!(admin.role, "admin");
    assert_eq!(admin.summary().username, "admin");
}
