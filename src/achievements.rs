use std::fmt;
use strum_macros::Display;
use tracing::info;

use crate::games::{PHONICS, VOCAB};
use crate::progress::{ProgressRecord, ProgressStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AchievementCategory {
    Progress,
    Mastery,
    Vocab,
    Special,
}

/// The session that just ended, as seen by achievement rules
#[derive(Debug, Clone, Copy)]
pub struct CompletedSession<'a> {
    pub game_type: &'a str,
    pub stars: u8,
    /// Size of the letter catalogue, for "played every letter"
    pub total_letters: usize,
}

type Rule = fn(&ProgressRecord, &CompletedSession) -> bool;

/// A persistent badge with the rule that unlocks it
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub category: AchievementCategory,
    rule: Rule,
}

impl fmt::Debug for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Achievement")
            .field("id", &self.id)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl Achievement {
    pub fn qualifies(&self, record: &ProgressRecord, session: &CompletedSession) -> bool {
        (self.rule)(record, session)
    }
}

const PERFECT: u8 = 3;

/// Every achievement, in the order they are checked and reported
pub static CATALOGUE: [Achievement; 14] = [
    Achievement {
        id: "firstStar",
        name: "Първа звезда",
        emoji: "🌟",
        description: "Спечели първата си звезда",
        category: AchievementCategory::Progress,
        rule: |r, _| r.total_stars() >= 1,
    },
    Achievement {
        id: "perfectRound",
        name: "Перфектен рунд",
        emoji: "💫",
        description: "Завърши рунд без грешки",
        category: AchievementCategory::Progress,
        rule: |r, s| s.game_type == PHONICS && r.categories_with_stars(PERFECT) >= 1,
    },
    Achievement {
        id: "threeStarLetter",
        name: "Майстор на буквата",
        emoji: "🏆",
        description: "Получи 3 звезди на буква",
        category: AchievementCategory::Mastery,
        rule: |r, _| r.categories_with_stars(PERFECT) >= 1,
    },
    Achievement {
        id: "fiveLetters",
        name: "Пет букви",
        emoji: "✋",
        description: "Изиграй 5 различни букви",
        category: AchievementCategory::Progress,
        rule: |r, _| r.categories_played() >= 5,
    },
    Achievement {
        id: "tenLetters",
        name: "Десет букви",
        emoji: "🔟",
        description: "Изиграй 10 различни букви",
        category: AchievementCategory::Progress,
        rule: |r, _| r.categories_played() >= 10,
    },
    Achievement {
        id: "allLettersPlayed",
        name: "Всички букви",
        emoji: "🎓",
        description: "Изиграй всички букви",
        category: AchievementCategory::Mastery,
        rule: |r, s| s.total_letters > 0 && r.categories_played() >= s.total_letters,
    },
    Achievement {
        id: "vocabFirst",
        name: "Картинен старт",
        emoji: "🖼️",
        description: "Завърши първата си игра \"Намери картинката\"",
        category: AchievementCategory::Vocab,
        rule: |r, s| s.game_type == VOCAB && r.games_played(VOCAB) >= 1,
    },
    Achievement {
        id: "vocabPerfect",
        name: "Перфектен речник",
        emoji: "📚",
        description: "Завърши \"Намери картинката\" без грешки",
        category: AchievementCategory::Vocab,
        rule: |_, s| s.game_type == VOCAB && s.stars >= PERFECT,
    },
    Achievement {
        id: "vocabFive",
        name: "Пет игри",
        emoji: "🎯",
        description: "Изиграй 5 игри \"Намери картинката\"",
        category: AchievementCategory::Vocab,
        rule: |r, s| s.game_type == VOCAB && r.games_played(VOCAB) >= 5,
    },
    Achievement {
        id: "explorer",
        name: "Изследовател",
        emoji: "🔍",
        description: "Опитай и двете игри",
        category: AchievementCategory::Special,
        rule: |r, _| r.categories_played() > 0 && r.games_played(VOCAB) > 0,
    },
    Achievement {
        id: "dedicated",
        name: "Отдаден ученик",
        emoji: "📖",
        description: "Събери 10 звезди общо",
        category: AchievementCategory::Special,
        rule: |r, _| r.total_stars() >= 10,
    },
    Achievement {
        id: "superstar",
        name: "Суперзвезда",
        emoji: "⭐",
        description: "Събери 20 звезди общо",
        category: AchievementCategory::Special,
        rule: |r, _| r.total_stars() >= 20,
    },
    Achievement {
        id: "champion",
        name: "Шампион",
        emoji: "🥇",
        description: "Получи 3 звезди на 5 букви",
        category: AchievementCategory::Mastery,
        rule: |r, _| r.categories_with_stars(PERFECT) >= 5,
    },
    Achievement {
        id: "master",
        name: "Магистър",
        emoji: "👑",
        description: "Получи 3 звезди на 10 букви",
        category: AchievementCategory::Mastery,
        rule: |r, _| r.categories_with_stars(PERFECT) >= 10,
    },
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOGUE.iter().find(|a| a.id == id)
}

/// Achievements that qualify now but are not yet unlocked, in catalogue order
pub fn newly_qualifying(
    record: &ProgressRecord,
    session: &CompletedSession,
) -> Vec<&'static Achievement> {
    CATALOGUE
        .iter()
        .filter(|a| !record.is_unlocked(a.id) && a.qualifies(record, session))
        .collect()
}

/// Unlock everything that newly qualifies and return what was unlocked.
///
/// Running it again without new progress unlocks nothing.
pub fn award(store: &mut dyn ProgressStore, session: &CompletedSession) -> Vec<&'static Achievement> {
    let record = store.read();
    let unlocked: Vec<_> = newly_qualifying(&record, session)
        .into_iter()
        .filter(|a| store.unlock(a.id))
        .collect();
    if !unlocked.is_empty() {
        info!(
            game = session.game_type,
            unlocked = ?unlocked.iter().map(|a| a.id).collect::<Vec<_>>(),
            "achievements unlocked"
        );
    }
    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryProgressStore;

    fn session(game_type: &str, stars: u8) -> CompletedSession<'_> {
        CompletedSession {
            game_type,
            stars,
            total_letters: 18,
        }
    }

    fn ids(list: &[&Achievement]) -> Vec<&'static str> {
        list.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_catalogue_ids_unique() {
        let mut ids: Vec<_> = CATALOGUE.iter().map(|a| a.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CATALOGUE.len());
    }

    #[test]
    fn test_first_perfect_phonics_session() {
        let mut store = MemoryProgressStore::new();
        store.set_best_score("А", 3);
        let unlocked = award(&mut store, &session(PHONICS, 3));
        assert_eq!(ids(&unlocked), vec!["firstStar", "perfectRound", "threeStarLetter"]);
    }

    #[test]
    fn test_award_is_idempotent() {
        let mut store = MemoryProgressStore::new();
        store.set_best_score("А", 2);
        assert_eq!(ids(&award(&mut store, &session(PHONICS, 2))), vec!["firstStar"]);
        assert!(award(&mut store, &session(PHONICS, 2)).is_empty());
        assert_eq!(store.read().unlocked, vec!["firstStar"]);
    }

    #[test]
    fn test_perfect_round_needs_phonics() {
        let mut store = MemoryProgressStore::new();
        store.set_best_score("А", 3);
        let unlocked = award(&mut store, &session("sorting", 3));
        assert!(!ids(&unlocked).contains(&"perfectRound"));
        assert!(ids(&unlocked).contains(&"threeStarLetter"));
        // Picked up later by a phonics session
        assert_eq!(ids(&award(&mut store, &session(PHONICS, 1))), vec!["perfectRound"]);
    }

    #[test]
    fn test_vocab_stickers() {
        let mut store = MemoryProgressStore::new();
        store.record_game_played(VOCAB);
        let unlocked = award(&mut store, &session(VOCAB, 3));
        assert_eq!(ids(&unlocked), vec!["vocabFirst", "vocabPerfect"]);

        for _ in 0..4 {
            store.record_game_played(VOCAB);
        }
        assert_eq!(ids(&award(&mut store, &session(VOCAB, 1))), vec!["vocabFive"]);
    }

    #[test]
    fn test_explorer_needs_both_games() {
        let mut store = MemoryProgressStore::new();
        store.set_best_score("Б", 1);
        assert!(!ids(&award(&mut store, &session(PHONICS, 1))).contains(&"explorer"));
        store.record_game_played(VOCAB);
        assert!(ids(&award(&mut store, &session(VOCAB, 1))).contains(&"explorer"));
    }

    #[test]
    fn test_star_totals_and_letter_counts() {
        let mut record = ProgressRecord::default();
        for letter in ["А", "Б", "В", "Г", "Д", "Е", "Ж"] {
            record.raise_best_score(letter, 3);
        }
        let found = ids(&newly_qualifying(&record, &session(PHONICS, 3)));
        assert_eq!(
            found,
            vec![
                "firstStar",
                "perfectRound",
                "threeStarLetter",
                "fiveLetters",
                "dedicated",
                "superstar",
                "champion"
            ]
        );
    }

    #[test]
    fn test_all_letters_played() {
        let mut record = ProgressRecord::default();
        record.raise_best_score("А", 1);
        record.raise_best_score("Б", 1);
        let small = CompletedSession {
            game_type: PHONICS,
            stars: 1,
            total_letters: 2,
        };
        assert!(ids(&newly_qualifying(&record, &small)).contains(&"allLettersPlayed"));
        assert!(!ids(&newly_qualifying(&record, &session(PHONICS, 1))).contains(&"allLettersPlayed"));
    }

    #[test]
    fn test_find() {
        assert_eq!(find("master").map(|a| a.emoji), Some("👑"));
        assert!(find("unicorn").is_none());
        assert_eq!(AchievementCategory::Special.to_string(), "special");
    }
}
