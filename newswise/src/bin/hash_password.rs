use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let password = std::env::args()
        .nth(1)
        .context("Usage: hash_password <password>")?;

    println!("{}", newswise::storage::hash_password(&password)?);
    Ok(())
}
