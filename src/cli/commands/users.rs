//! List users command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_users(config: &Config, query: Option<&str>) -> anyhow::Result<()> {
    let store = Store::from_config(&config.general).await?;
    let users = store.list_users(query).await?;

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let stats = store.user_stats(user.id).await?;
        println!("#{:<5} {} <{}>", user.id, user.username, user.email);
        println!(
            "  Messages: {} | Followers: {} | Following: {} | Likes: {}",
            stats.messages, stats.followers, stats.following, stats.likes
        );
    }

    Ok(())
}
