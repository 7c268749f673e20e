mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use groupedit::{
    ApiEvent, Enricher, GroupIds, GroupLookup, GroupResolver, HasGroups, ResponsePayload,
    build_acl, store,
};
use migration::{Migrator, MigratorTrait};
use platform_authz::Privilege;
use platform_db::{DbPool, connect};
use platform_obs::{ObsConfig, init_tracing};
use tracing::info;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "groupedit", version, about = "Group-shared editing for resources")]
struct Cli {
    /// Database URL; falls back to DATABASE_URL.
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// Debug logging for the groupedit crates.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Print the groups a user or a resource belongs to.
    #[command(subcommand)]
    Groups(GroupsCommand),
    /// Evaluate one permission decision and show the facts behind it.
    Explain(ExplainCommand),
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Roll back the most recent migration.
    Down,
}

#[derive(Subcommand, Debug)]
enum GroupsCommand {
    User { id: i32 },
    Resource { id: i32 },
}

#[derive(Args, Debug)]
struct ExplainCommand {
    #[arg(long)]
    user: i32,
    #[arg(long)]
    resource: i32,
    #[arg(long, default_value = "update")]
    privilege: Privilege,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(ObsConfig::default().verbose(cli.verbose))?;
    let config = AppConfig::load(cli.database_url)?;
    let pool = connect(&config.database)
        .await
        .context("failed to open database")?;

    match cli.command {
        Command::Migrate(MigrateCommand::Up) => {
            Migrator::up(&pool, None).await?;
            info!("database migrations applied");
        }
        Command::Migrate(MigrateCommand::Down) => {
            Migrator::down(&pool, Some(1)).await?;
            info!("most recent migration rolled back");
        }
        Command::Groups(cmd) => print_groups(pool, cmd).await?,
        Command::Explain(cmd) => explain(pool, &config, cmd).await?,
    }
    Ok(())
}

async fn print_groups(pool: DbPool, cmd: GroupsCommand) -> Result<()> {
    let resolver = GroupResolver::new(pool);
    let (label, groups) = match cmd {
        GroupsCommand::User { id } => (format!("user {id}"), resolver.groups_for_user(id).await?),
        GroupsCommand::Resource { id } => (
            format!("resource {id}"),
            resolver.groups_for_resource(id).await?,
        ),
    };
    println!("{label}: {}", describe(Some(&groups)));
    Ok(())
}

async fn explain(pool: DbPool, config: &AppConfig, cmd: ExplainCommand) -> Result<()> {
    let mut user = store::load_user(&pool, cmd.user).await?;
    let resource = store::load_resource(&pool, cmd.resource).await?;

    let enricher = Enricher::new(GroupResolver::new(pool), &config.groupedit);
    let mut payload = ResponsePayload::One(resource);
    enricher
        .handle(ApiEvent::ReadPost, Some(&mut user), &mut payload)
        .await?;
    let [resource] = payload.resources() else {
        anyhow::bail!("read payload lost its resource");
    };

    let acl = build_acl(&config.groupedit);
    let decision = acl.decide(&user, resource, cmd.privilege);
    let identity = user.identity();
    let target = resource.resource();

    println!("user {} ({})", identity.user_id, identity.role);
    println!("  groups: {}", describe(user.group_ids()));
    println!(
        "resource {} ({}, owner {})",
        target.id,
        target.kind,
        target
            .owner_id
            .map_or_else(|| "none".to_string(), |owner| owner.to_string())
    );
    println!("  groups: {}", describe(resource.group_ids()));
    println!("{}: {:?}", cmd.privilege, decision);
    Ok(())
}

fn describe(groups: Option<&GroupIds>) -> String {
    match groups {
        None => "not attached".to_string(),
        Some(groups) if groups.is_empty() => "none".to_string(),
        Some(groups) => groups
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}
