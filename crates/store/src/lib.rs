//! SQLite-backed guild store.

use {
    async_trait::async_trait,
    herald_common::{GuildId, GuildProfile, UserId, now_ms},
    herald_gateway::ports::GuildStore,
    sqlx::sqlite::{SqliteConnectOptions, SqlitePool},
    std::path::Path,
    tracing::debug,
};

pub struct SqliteGuildStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct GuildRow {
    guild_id: String,
    name: String,
    owner_id: String,
    member_count: i64,
    is_active: i64,
    joined_at: i64,
    left_at: Option<i64>,
    last_updated: i64,
}

impl TryFrom<GuildRow> for GuildProfile {
    type Error = anyhow::Error;

    fn try_from(r: GuildRow) -> anyhow::Result<Self> {
        Ok(Self {
            guild_id: GuildId(r.guild_id.parse()?),
            name: r.name,
            owner_id: UserId(r.owner_id.parse()?),
            member_count: r.member_count,
            is_active: r.is_active != 0,
            joined_at: r.joined_at,
            left_at: r.left_at,
            last_updated: r.last_updated,
        })
    }
}

impl SqliteGuildStore {
    /// Open (creating if missing) the database at `path`.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Self::init(&pool).await?;
        debug!(path = %path.display(), "guild store opened");
        Ok(Self { pool })
    }

    /// In-memory database, used by tests.
    pub async fn open_in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        Self::init(&pool).await?;
        Ok(Self { pool })
    }

    async fn init(pool: &SqlitePool) -> anyhow::Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS guilds (
                guild_id     TEXT PRIMARY KEY,
                name         TEXT NOT NULL,
                owner_id     TEXT NOT NULL,
                member_count INTEGER NOT NULL DEFAULT 0,
                is_active    INTEGER NOT NULL DEFAULT 1,
                joined_at    INTEGER NOT NULL,
                left_at      INTEGER,
                last_updated INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, guild_id: GuildId) -> anyhow::Result<Option<GuildProfile>> {
        let row = sqlx::query_as::<_, GuildRow>("SELECT * FROM guilds WHERE guild_id = ?")
            .bind(guild_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(GuildProfile::try_from).transpose()
    }
}

#[async_trait]
impl GuildStore for SqliteGuildStore {
    async fn upsert_guild(&self, profile: &GuildProfile) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO guilds
                 (guild_id, name, owner_id, member_count, is_active,
                  joined_at, left_at, last_updated)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(guild_id) DO UPDATE SET
                 name = excluded.name,
                 owner_id = excluded.owner_id,
                 member_count = excluded.member_count,
                 is_active = excluded.is_active,
                 left_at = excluded.left_at,
                 last_updated = excluded.last_updated"#,
        )
        .bind(profile.guild_id.to_string())
        .bind(&profile.name)
        .bind(profile.owner_id.to_string())
        .bind(profile.member_count)
        .bind(profile.is_active as i64)
        .bind(profile.joined_at)
        .bind(profile.left_at)
        .bind(profile.last_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_guild_left(&self, guild_id: GuildId, left_at_ms: i64) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE guilds SET is_active = 0, left_at = ?, last_updated = ? WHERE guild_id = ?",
        )
        .bind(left_at_ms)
        .bind(now_ms())
        .bind(guild_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn adjust_member_count(&self, guild_id: GuildId, delta: i64) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE guilds SET member_count = member_count + ?, last_updated = ? WHERE guild_id = ?",
        )
        .bind(delta)
        .bind(now_ms())
        .bind(guild_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
