use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: &'static str,
    pub text: &'static str,
    pub word_suggestions: &'static [&'static str],
    pub skip_phrases: &'static [&'static str],
}

pub static PROMPTS: [Prompt; 3] = [
    Prompt {
        id: "reflection",
        text: "What is something you would have done differently today?",
        word_suggestions: &["apologize", "focus", "avoid", "listen"],
        skip_phrases: &["I was perfect today", "Nothing to reflect on"],
    },
    Prompt {
        id: "grateful",
        text: "What is something you're grateful for today?",
        word_suggestions: &["family", "sunset", "friend", "good food"],
        skip_phrases: &["Nothing much good happened today", "Can't think of anything"],
    },
    Prompt {
        id: "achievement",
        text: "What did you accomplish today?",
        word_suggestions: &["finished work", "exercise", "called a friend"],
        skip_phrases: &["Nothing worth mentioning", "No achievements today"],
    },
];

const POST_ENTRY_FEEDBACK: [&str; 5] = [
    "Nice job! Your thoughts are safe here.",
    "Entry saved! You did great.",
    "Awesome work, keep it up!",
    "Another day, another reflection. Well done!",
    "Fantastic! Your journal thanks you.",
];

const REMINDERS: [&str; 4] = [
    "Time to check in with yourself!",
    "Your journal misses you!",
    "A moment for reflection, perhaps?",
    "Quick journal time!",
];

const WEEKLY_HEADLINES: [&str; 3] = [
    "Here's a look back at your week!",
    "Your weekly journey at a glance:",
    "Reflecting on your past seven days...",
];

const MONTHLY_HEADLINES: [&str; 3] = [
    "A full month of insights!",
    "Your monthly recap is ready.",
    "Dive into your last 30 days of thoughts.",
];

pub fn prompt(id: &str) -> Option<&'static Prompt> {
    PROMPTS.iter().find(|prompt| prompt.id == id)
}

pub fn post_entry_feedback(date: NaiveDate) -> &'static str {
    pick(&POST_ENTRY_FEEDBACK, date)
}

pub fn reminder(date: NaiveDate) -> &'static str {
    pick(&REMINDERS, date)
}

pub fn weekly_headline(date: NaiveDate) -> &'static str {
    pick(&WEEKLY_HEADLINES, date)
}

pub fn monthly_headline(date: NaiveDate) -> &'static str {
    pick(&MONTHLY_HEADLINES, date)
}

// Rotates by day so the same date always reads the same.
fn pick(phrases: &'static [&'static str], date: NaiveDate) -> &'static str {
    let index = date.num_days_from_ce().unsigned_abs() as usize % phrases.len();
    phrases[index]
}

#[cfg(test)]
mod tests {
    use super::{POST_ENTRY_FEEDBACK, post_entry_feedback, prompt};
    use chrono::NaiveDate;

    #[test]
    fn prompt_lookup_by_id() {
        assert_eq!(
            prompt("grateful").map(|found| found.text),
            Some("What is something you're grateful for today?")
        );
        assert!(prompt("unknown").is_none());
    }

    #[test]
    fn phrase_rotation_is_stable_per_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let next = day.succ_opt().expect("valid date");

        assert_eq!(post_entry_feedback(day), post_entry_feedback(day));
        assert!(POST_ENTRY_FEEDBACK.contains(&post_entry_feedback(next)));
        assert_ne!(post_entry_feedback(day), post_entry_feedback(next));
    }
}
