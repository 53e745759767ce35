use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use uuid::Uuid;

use company_access::authz::{
    AccessEngine, IdentityReader, IdentityRepository, MembershipRepository, Principal, Provider,
};
use company_access::db::{SqliteIdentityRepository, SqliteMembershipRepository};
use company_access::models::{ActorRef, CompanyId, IdentityId, Role};

async fn setup_pool() -> Result<(TempDir, SqlitePool)> {
    let dir = tempdir()?;
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("access.db"))
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(opts)
        .await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    Ok((dir, pool))
}

async fn insert_company(pool: &SqlitePool, name: &str) -> Result<CompanyId> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO companies (id, name, created_at) VALUES (?, ?, ?)")
        .bind(id.to_string())
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(CompanyId::new(id))
}

async fn insert_role(pool: &SqlitePool, company_id: CompanyId, identity_id: IdentityId, role: Role) -> Result<()> {
    sqlx::query("INSERT INTO company_member_roles (company_id, identity_id, role, created_at) VALUES (?, ?, ?, ?)")
        .bind(company_id.to_string())
        .bind(identity_id.to_string())
        .bind(role.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(())
}

async fn identity_count(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM identities").fetch_one(pool).await?)
}

#[tokio::test]
async fn create_then_find_returns_same_identity() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    let repo = SqliteIdentityRepository::new(pool.clone());
    let actor = ActorRef::new(Uuid::new_v4(), "Notch");

    assert!(repo.find_by_actor(&actor).await?.is_none());

    let created = repo.create(&actor).await?;
    let found = repo.find_by_actor(&actor).await?.expect("identity persisted");
    assert_eq!(created.id, found.id);
    assert_eq!(found.actor_id, actor.id);
    assert_eq!(found.display_name, "Notch");

    // A second create under a new label keeps the original record
    let again = repo.create(&ActorRef::new(actor.id, "Notch2")).await?;
    assert_eq!(again.id, created.id);
    assert_eq!(again.display_name, "Notch");
    assert_eq!(identity_count(&pool).await?, 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_persist_one_identity() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    let repo = Arc::new(SqliteIdentityRepository::new(pool.clone()));
    let actor = ActorRef::new(Uuid::new_v4(), "Racer");

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..12 {
        let repo = Arc::clone(&repo);
        let actor = actor.clone();
        tasks.spawn(async move { repo.create(&actor).await.map(|identity| identity.id) });
    }

    let mut ids = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        ids.push(joined??);
    }

    assert!(ids.iter().all(|id| *id == ids[0]), "callers saw different ids: {:?}", ids);
    assert_eq!(identity_count(&pool).await?, 1);

    Ok(())
}

#[tokio::test]
async fn membership_is_built_from_role_rows() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    let identities = SqliteIdentityRepository::new(pool.clone());
    let memberships = SqliteMembershipRepository::new(pool.clone());

    let company_id = insert_company(&pool, "Acme Transit").await?;
    let identity = identities.create(&ActorRef::new(Uuid::new_v4(), "Dana")).await?;

    assert!(memberships.find_membership(company_id, identity.id).await?.is_none());

    insert_role(&pool, company_id, identity.id, Role::Operator).await?;
    insert_role(&pool, company_id, identity.id, Role::Manager).await?;

    let membership = memberships
        .find_membership(company_id, identity.id)
        .await?
        .expect("membership exists once a role row exists");
    assert_eq!(membership.company_id(), company_id);
    assert_eq!(membership.identity_id(), identity.id);
    assert!(membership.has_role(Role::Manager));
    assert!(membership.has_role(Role::Operator));
    assert!(!membership.has_role(Role::Owner));

    Ok(())
}

#[tokio::test]
async fn engine_over_sqlite_honours_roles() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    let identities = Arc::new(SqliteIdentityRepository::new(pool.clone()));
    let provider = Provider::new(
        Arc::clone(&identities),
        Arc::new(SqliteMembershipRepository::new(pool.clone())),
    );
    let read_only = provider.read_only();
    let engine = AccessEngine::default();

    let company_id = insert_company(&pool, "Acme Transit").await?;
    let member = Principal::player(ActorRef::new(Uuid::new_v4(), "Member"));
    let owner = Principal::player(ActorRef::new(Uuid::new_v4(), "Owner"));

    let member_identity = identities.create(member.actor().expect("player")).await?;
    let owner_identity = identities.create(owner.actor().expect("player")).await?;
    insert_role(&pool, company_id, member_identity.id, Role::Member).await?;
    insert_role(&pool, company_id, owner_identity.id, Role::Owner).await?;

    assert!(engine.can_read_if_known(Some(&member), Some(&read_only), Some(company_id)).await?);
    assert!(!engine.can_manage_if_known(Some(&member), Some(&read_only), Some(company_id)).await?);
    assert!(engine.can_manage(Some(&owner), Some(&provider), Some(company_id)).await?);

    // Unknown company: not a member anywhere, not an error
    let missing = CompanyId::new(Uuid::new_v4());
    assert!(!engine.can_read(Some(&owner), Some(&provider), Some(missing)).await?);

    // Completion-style lookup for a stranger writes nothing
    let stranger = Principal::player(ActorRef::new(Uuid::new_v4(), "Stranger"));
    assert!(!engine.can_read_if_known(Some(&stranger), Some(&read_only), Some(company_id)).await?);
    assert_eq!(identity_count(&pool).await?, 2);

    // Action-style check provisions exactly once
    assert!(!engine.can_read(Some(&stranger), Some(&provider), Some(company_id)).await?);
    assert!(!engine.can_read(Some(&stranger), Some(&provider), Some(company_id)).await?);
    assert_eq!(identity_count(&pool).await?, 3);

    Ok(())
}

#[tokio::test]
async fn storage_failure_surfaces_as_error() -> Result<()> {
    let (_dir, pool) = setup_pool().await?;
    let provider = Provider::new(
        Arc::new(SqliteIdentityRepository::new(pool.clone())),
        Arc::new(SqliteMembershipRepository::new(pool.clone())),
    );
    pool.close().await;

    let player = Principal::player(ActorRef::new(Uuid::new_v4(), "Eve"));
    let result = AccessEngine::default()
        .can_read(Some(&player), Some(&provider), Some(CompanyId::new(Uuid::new_v4())))
        .await;
    assert!(result.is_err(), "closed pool must not read as a denial");

    Ok(())
}
