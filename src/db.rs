use anyhow::Context;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

pub async fn init_db(database_url: &str) -> anyhow::Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    const SCHEMA: &str = include_str!("../migrations/20260101000000_init.sql");

    #[test]
    fn a_user_leads_at_most_one_department() {
        let departments = SCHEMA
            .split("CREATE TABLE departments")
            .nth(1)
            .and_then(|rest| rest.split(");").next())
            .unwrap();
        let leader = departments
            .lines()
            .find(|line| line.trim_start().starts_with("leader_id"))
            .unwrap();
        assert!(leader.contains("UNIQUE"), "{leader}");
    }
}
