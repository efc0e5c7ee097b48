use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use query_engine_translation::translation;

/// Build the prompt for a golden test case.
///
/// Each case directory holds `schema.json` (a schema description) and
/// `question.txt` (the raw question). The current date is pinned so the
/// snapshots are stable.
pub fn test_prompt(testname: &str) -> Result<String, translation::Error> {
    let directory = PathBuf::from("tests/goldenfiles").join(testname);

    let schema = serde_json::from_str(
        fs::read_to_string(directory.join("schema.json"))
            .unwrap()
            .as_str(),
    )
    .unwrap();
    let question = fs::read_to_string(directory.join("question.txt")).unwrap();

    let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let enhanced = translation::enhance(&translation::Question::new(question)?, today);
    let prompt = translation::build_prompt(
        &enhanced,
        &schema,
        &translation::PromptSettings::default(),
    )?;

    Ok(prompt.as_str().to_string())
}
