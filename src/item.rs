use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};

static DATA_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/data");

const DEFAULT_DATA_FILE: &str = "words.json";

/// An atomic content unit (word, letter or syllable) drawn from a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub display_text: String,
    /// Logical sound reference resolved by the audio engine, not a path
    pub audio_ref: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub syllables: Vec<String>,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        display_text: impl Into<String>,
        audio_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_text: display_text.into(),
            audio_ref: audio_ref.into(),
            tags: BTreeSet::new(),
            category: None,
            emoji: None,
            syllables: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category.as_deref() == Some(category)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LetterEntry {
    pub letter: String,
    pub instruction_text: String,
    pub audio: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Phrase {
    pub file: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeedbackPhrases {
    pub correct: Phrase,
    pub incorrect: Phrase,
}

#[derive(Debug, Clone, Deserialize)]
struct WordEntry {
    id: String,
    word: String,
    starts_with: String,
    #[serde(default)]
    emoji: Option<String>,
    audio: String,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    syllables: Vec<String>,
}

impl From<WordEntry> for Item {
    fn from(w: WordEntry) -> Self {
        Item {
            id: w.id,
            display_text: w.word,
            audio_ref: w.audio,
            tags: w.tags,
            category: Some(w.starts_with),
            emoji: w.emoji,
            syllables: w.syllables,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ContentData {
    letters: Vec<LetterEntry>,
    words: Vec<WordEntry>,
    feedback: FeedbackPhrases,
    #[serde(default)]
    vowels: Vec<String>,
    #[serde(default)]
    consonants: Vec<String>,
    #[serde(default)]
    distractor_syllables: Vec<String>,
}

/// Immutable content loaded once per process
#[derive(Debug, Clone)]
pub struct ItemPool {
    words: Vec<Item>,
    letters: Vec<LetterEntry>,
    pub feedback: FeedbackPhrases,
    pub vowels: Vec<String>,
    pub consonants: Vec<String>,
    pub distractor_syllables: Vec<String>,
}

impl ItemPool {
    /// Load the content bundled into the binary
    pub fn embedded() -> Result<Self> {
        let file = DATA_DIR.get_file(DEFAULT_DATA_FILE).ok_or_else(|| {
            Error::MissingContent(format!("{DEFAULT_DATA_FILE} not bundled"))
        })?;
        let contents = file.contents_utf8().ok_or_else(|| {
            Error::MissingContent(format!("{DEFAULT_DATA_FILE} is not valid utf-8"))
        })?;
        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let data: ContentData = serde_json::from_str(json)?;
        Ok(Self {
            words: data.words.into_iter().map(Item::from).collect(),
            letters: data.letters,
            feedback: data.feedback,
            vowels: data.vowels,
            consonants: data.consonants,
            distractor_syllables: data.distractor_syllables,
        })
    }

    pub fn words(&self) -> &[Item] {
        &self.words
    }

    pub fn letters(&self) -> &[LetterEntry] {
        &self.letters
    }

    pub fn letter_names(&self) -> Vec<String> {
        self.letters.iter().map(|l| l.letter.clone()).collect()
    }

    pub fn letter(&self, letter: &str) -> Option<&LetterEntry> {
        self.letters.iter().find(|l| l.letter == letter)
    }

    pub fn find(&self, id: &str) -> Option<&Item> {
        self.words.iter().find(|w| w.id == id)
    }

    /// Words usable by a game, by tag
    pub fn tagged(&self, tag: &str) -> Vec<Item> {
        self.words.iter().filter(|w| w.has_tag(tag)).cloned().collect()
    }

    pub fn in_category(&self, category: &str) -> Vec<Item> {
        self.words
            .iter()
            .filter(|w| w.in_category(category))
            .cloned()
            .collect()
    }

    /// Reverse mapping from sound reference to the text it speaks.
    ///
    /// Used by the audio engine when an asset cannot be played.
    pub fn speech_texts(&self) -> HashMap<String, String> {
        let mut texts = HashMap::new();
        for letter in &self.letters {
            texts.insert(letter.audio.clone(), letter.instruction_text.clone());
        }
        texts.insert(
            self.feedback.correct.file.clone(),
            self.feedback.correct.text.clone(),
        );
        texts.insert(
            self.feedback.incorrect.file.clone(),
            self.feedback.incorrect.text.clone(),
        );
        for word in &self.words {
            texts
                .entry(word.audio_ref.clone())
                .or_insert_with(|| word.display_text.clone());
        }
        texts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_embedded_pool_loads() {
        let pool = ItemPool::embedded().unwrap();
        assert!(!pool.words().is_empty());
        assert!(pool.letters().len() >= 10);
        assert_eq!(pool.letters()[0].letter, "А");
    }

    #[test]
    fn test_item_ids_are_unique() {
        let pool = ItemPool::embedded().unwrap();
        let ids: HashSet<&str> = pool.words().iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids.len(), pool.words().len());
    }

    #[test]
    fn test_every_letter_has_words() {
        let pool = ItemPool::embedded().unwrap();
        for letter in pool.letter_names() {
            assert!(
                !pool.in_category(&letter).is_empty(),
                "no words for letter {letter}"
            );
        }
    }

    #[test]
    fn test_train_words_have_several_syllables() {
        let pool = ItemPool::embedded().unwrap();
        let train = pool.tagged("train");
        assert!(!train.is_empty());
        assert!(train.iter().all(|w| w.syllables.len() > 1));
    }

    #[test]
    fn test_speech_texts_cover_feedback_and_words() {
        let pool = ItemPool::embedded().unwrap();
        let texts = pool.speech_texts();
        assert_eq!(texts.get("bravo.mp3").map(String::as_str), Some("Браво!"));
        assert_eq!(texts.get("kotka.mp3").map(String::as_str), Some("котка"));
        assert!(texts.contains_key("instr_a.mp3"));
    }

    #[test]
    fn test_from_json_minimal() {
        let json = r#"
        {
            "letters": [{"letter": "Б", "instruction_text": "Б", "audio": "b.mp3"}],
            "words": [{"id": "banan", "word": "банан", "starts_with": "Б", "audio": "banan.mp3"}],
            "feedback": {
                "correct": {"file": "ok.mp3", "text": "ok"},
                "incorrect": {"file": "no.mp3", "text": "no"}
            }
        }
        "#;
        let pool = ItemPool::from_json(json).unwrap();
        assert_eq!(pool.words().len(), 1);
        assert_eq!(pool.words()[0].category.as_deref(), Some("Б"));
        assert!(pool.words()[0].tags.is_empty());
        assert!(pool.vowels.is_empty());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(ItemPool::from_json("{ not json").is_err());
    }
}
