use super::*;
use storage::Storage;

fn config() -> JwtConfig {
    JwtConfig {
        secret: "unit-secret".to_string(),
        ttl_minutes: 120,
    }
}

async fn user(role: &str) -> StoredUser {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.create_user("jwt-user", "pw", role).await.expect("user");
    storage
        .find_user_by_username("jwt-user")
        .await
        .expect("lookup")
        .expect("user")
}

#[tokio::test]
async fn minted_token_round_trips_claims() {
    let cfg = config();
    let admin = user("admin").await;
    let token = mint_access_token(&cfg, &admin).expect("mint");

    let claims = verify_access_token(&cfg, &token).expect("verify");
    assert_eq!(claims.role, "admin");
    assert_eq!(claims.scope, "read write");
    assert_eq!(claims.user_id(), Some(admin.user_id));
    assert_eq!(claims.exp - claims.iat, 120 * 60);
    assert!(claims.is_admin());
}

#[tokio::test]
async fn rejects_token_signed_with_other_secret() {
    let viewer = user("viewer").await;
    let token = mint_access_token(&config(), &viewer).expect("mint");
    let other = JwtConfig {
        secret: "other".to_string(),
        ttl_minutes: 120,
    };
    assert!(verify_access_token(&other, &token).is_err());
}

#[tokio::test]
async fn rejects_expired_token() {
    let viewer = user("viewer").await;
    let expired = JwtConfig {
        secret: "unit-secret".to_string(),
        ttl_minutes: -10,
    };
    let token = mint_access_token(&expired, &viewer).expect("mint");
    assert!(verify_access_token(&config(), &token).is_err());
}
