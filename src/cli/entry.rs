use crate::journal::catalog::MoodCatalog;
use crate::journal::prompts::{PROMPTS, prompt};
use crate::journal::{DEFAULT_INTENSITY, EntryDetail, MAX_INTENSITY, MIN_INTENSITY, MoodTag};
use anyhow::{Context, Result, anyhow, bail};
use dialoguer::{Input, MultiSelect, Select, theme::ColorfulTheme};

/// `happy` or `happy:3`; the mood may be given by id or by word.
pub fn parse_mood_spec(catalog: &MoodCatalog, raw: &str) -> Result<MoodTag> {
    let (key, intensity) = match raw.split_once(':') {
        Some((key, level)) => {
            let level = level
                .trim()
                .parse::<i64>()
                .map_err(|_| anyhow!("Intensity must be a number between 1 and 4: {raw}"))?;
            (key, level)
        }
        None => (raw, i64::from(DEFAULT_INTENSITY)),
    };

    let mood = catalog
        .find(key.trim())
        .with_context(|| format!("Unknown mood: {}. Run `MoodLog mood list`", key.trim()))?;

    Ok(MoodTag::new(mood.clone(), intensity))
}

/// `prompt_id=text`, checked against the known prompts.
pub fn parse_prompt_pair(raw: &str) -> Result<(String, String)> {
    let Some((id, text)) = raw.split_once('=') else {
        bail!("Expected prompt_id=text, got: {raw}");
    };

    let id = id.trim();
    if prompt(id).is_none() {
        let known = PROMPTS.iter().map(|prompt| prompt.id).collect::<Vec<_>>();
        bail!("Unknown prompt: {id}. Known prompts: {}", known.join(", "));
    }

    let text = text.trim();
    if text.is_empty() {
        bail!("Empty text for prompt: {id}");
    }

    Ok((id.to_string(), text.to_string()))
}

pub fn run_interactive_entry(catalog: &MoodCatalog) -> Result<(Vec<EntryDetail>, Vec<MoodTag>)> {
    let theme = ColorfulTheme::default();
    let mut details = Vec::new();

    for (index, current) in PROMPTS.iter().enumerate() {
        println!("\n[{}/{}] {}", index + 1, PROMPTS.len(), current.text);
        println!("  ideas: {}", current.word_suggestions.join(", "));

        let mut choices = vec!["Write an answer".to_string()];
        choices.extend(
            current
                .skip_phrases
                .iter()
                .map(|phrase| format!("Skip: {phrase}")),
        );

        let choice = Select::with_theme(&theme)
            .with_prompt("  How do you want to answer?")
            .default(0)
            .items(&choices)
            .interact()
            .context("Failed to read prompt choice")?;

        if choice == 0 {
            let text: String = Input::with_theme(&theme)
                .with_prompt("  Your answer")
                .interact_text()
                .context("Failed to read prompt answer")?;
            details.push(EntryDetail {
                prompt_id: current.id.to_string(),
                entry_text: text.trim().to_string(),
            });
        } else if let Some(phrase) = current.skip_phrases.get(choice - 1) {
            details.push(EntryDetail::skipped(current.id, phrase));
        }
    }

    let words = catalog
        .words()
        .iter()
        .map(|mood| mood.word.clone())
        .collect::<Vec<_>>();

    println!("\nHow are you feeling?");
    let selected = MultiSelect::with_theme(&theme)
        .with_prompt("  Pick your moods (space to toggle)")
        .items(&words)
        .interact()
        .context("Failed to read mood selection")?;

    let mut moods = Vec::new();
    for index in selected {
        let Some(mood) = catalog.words().get(index) else {
            continue;
        };

        let level: u8 = Input::with_theme(&theme)
            .with_prompt(format!("  {} intensity ({MIN_INTENSITY}-{MAX_INTENSITY})", mood.word))
            .default(DEFAULT_INTENSITY)
            .validate_with(|input: &u8| -> std::result::Result<(), &str> {
                if (MIN_INTENSITY..=MAX_INTENSITY).contains(input) {
                    Ok(())
                } else {
                    Err("Intensity must be between 1 and 4")
                }
            })
            .interact_text()
            .context("Failed to read mood intensity")?;

        moods.push(MoodTag::new(mood.clone(), i64::from(level)));
    }

    Ok((details, moods))
}

#[cfg(test)]
mod tests {
    use super::{parse_mood_spec, parse_prompt_pair};
    use crate::journal::catalog::MoodCatalog;

    #[test]
    fn mood_spec_defaults_and_clamps_intensity() {
        let catalog = MoodCatalog::default();

        let plain = parse_mood_spec(&catalog, "calm").expect("known mood");
        assert_eq!((plain.mood.id.as_str(), plain.intensity), ("calm", 2));

        let loud = parse_mood_spec(&catalog, "Happy:9").expect("known mood");
        assert_eq!((loud.mood.id.as_str(), loud.intensity), ("happy", 4));

        assert!(parse_mood_spec(&catalog, "bored").is_err());
        assert!(parse_mood_spec(&catalog, "happy:lots").is_err());
    }

    #[test]
    fn prompt_pairs_require_known_prompt_and_text() {
        assert_eq!(
            parse_prompt_pair("grateful= my cat ").expect("valid pair"),
            ("grateful".to_string(), "my cat".to_string())
        );
        assert!(parse_prompt_pair("grateful").is_err());
        assert!(parse_prompt_pair("dreams=flying").is_err());
        assert!(parse_prompt_pair("grateful=  ").is_err());
    }
}
