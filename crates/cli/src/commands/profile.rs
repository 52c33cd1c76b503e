//! Profile lookup command handler.

use clap::Args;
use kindred_core::AppResult;
use kindred_engine::EngineContext;

/// Show the profile owned by a user
#[derive(Args, Debug)]
pub struct ProfileCommand {
    /// Owner id to look up
    #[arg(long)]
    pub owner: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ProfileCommand {
    pub async fn execute(&self, context: &EngineContext) -> AppResult<()> {
        let profile = context.service.get_profile_by_owner(&self.owner).await?;

        if self.json {
            super::insert::print_profile_json(&profile)?;
        } else {
            println!("Profile {}", profile.id);
            println!("  name:      {}", profile.metadata.name);
            println!("  location:  {}", profile.metadata.location);
            println!("  age:       {}", profile.metadata.age);
            println!("  narrative: {}", profile.metadata.narrative);
            if profile.metadata.is_matched() {
                println!("  match:     {}", profile.metadata.match_id);
            } else {
                println!("  match:     (unmatched)");
            }
        }

        Ok(())
    }
}
