use crate::cli::SlugCommand;
use crate::services::hashid::HashIds;
use crate::Config;
use anyhow::Result;
use std::path::Path;

pub fn run(config_path: &Path, command: SlugCommand) -> Result<()> {
    let config = Config::load(config_path)?;
    let hashids = HashIds::from_config(&config.slugs)?;

    match command {
        SlugCommand::Encode { id } => {
            let slug = hashids.encode(id);
            println!("{}", slug);
            println!("{}/s/{}", config.site.url.trim_end_matches('/'), slug);
        }
        SlugCommand::Decode { slug } => match hashids.decode(&slug) {
            Some(id) => println!("{}", id),
            None => anyhow::bail!("'{}' is not a valid gallery slug", slug),
        },
    }

    Ok(())
}
