use crate::journal::UserProfile;
use anyhow::{Context, Result};
use dialoguer::{Password, theme::ColorfulTheme};

/// Asks for the PIN when the profile has the lock enabled.
pub fn unlock(profile: &UserProfile) -> Result<()> {
    if !profile.pin_required() {
        return Ok(());
    }

    let attempt = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter PIN")
        .interact()
        .context("Failed to read PIN")?;

    profile.check_pin(&attempt)
}

#[cfg(test)]
mod tests {
    use super::unlock;
    use crate::journal::UserProfile;

    #[test]
    fn unlocked_profile_skips_the_prompt() {
        assert!(unlock(&UserProfile::default()).is_ok());

        let disabled = UserProfile::default()
            .set_field("pin", "1234")
            .and_then(|profile| profile.set_field("pinEnabled", "false"))
            .expect("profile");
        assert!(unlock(&disabled).is_ok());
    }
}
