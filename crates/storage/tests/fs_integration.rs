use std::sync::Arc;

use qcm_core::model::BankId;
use storage::bank::{BankStore, StorageError};
use storage::fs::FsBankStore;
use storage::progress::{FileProgressStore, MasterySnapshot, MasteryStore, ProgressStore};

const CARDIO_BANK: &str = r#"[
  {
    "Topic": "ECG de repos",
    "Category": "Cardiologie",
    "QuestionText": "Quel est le rythme normal ?",
    "YearAsked": "Février 2025",
    "Choice_A_Text": "Sinusal",
    "Choice_A_isCorrect": true,
    "Choice_A_Explanation": "Le rythme sinusal est physiologique.",
    "Choice_B_Text": "Jonctionnel",
    "Choice_B_isCorrect": false,
    "Choice_B_Explanation": ""
  },
  {
    "QuestionText": "Quelle dérivation explore la paroi inférieure ?",
    "YearAsked": "Juin 2024",
    "Choice_A_Text": "DII",
    "Choice_A_isCorrect": true,
    "Choice_B_Text": "V1",
    "Choice_B_isCorrect": false
  }
]"#;

const PNEUMO_BANK: &str = r#"[
  {
    "category": "Pneumologie",
    "QuestionText": "Signe d'un pneumothorax ?",
    "Choice_A_Text": "Tympanisme",
    "Choice_A_isCorrect": true,
    "Choice_B_Text": "Matité",
    "Choice_B_isCorrect": false
  }
]"#;

fn seed_data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("Cardiologie (Février 2025).json"),
        CARDIO_BANK,
    )
    .unwrap();
    std::fs::write(dir.path().join("Pneumologie (Juin 2024).json"), PNEUMO_BANK).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "pas une banque").unwrap();
    dir
}

#[tokio::test]
async fn lists_json_banks_with_derived_metadata() {
    let dir = seed_data_dir();
    let store = FsBankStore::new(dir.path());

    let banks = store.list_banks().await.unwrap();
    assert_eq!(banks.len(), 2, "non-json files must be ignored");

    let cardio = banks
        .iter()
        .find(|b| b.id.as_str() == "Cardiologie (Février 2025)")
        .unwrap();
    assert_eq!(cardio.name, "ECG de repos");
    assert_eq!(cardio.category, "Cardiologie");
    assert_eq!(cardio.question_count, 2);
    assert_eq!(
        cardio.years,
        vec!["Février 2025".to_string(), "Juin 2024".to_string()]
    );
    assert!(cardio.size_bytes > 0);

    let pneumo = banks
        .iter()
        .find(|b| b.id.as_str() == "Pneumologie (Juin 2024)")
        .unwrap();
    assert_eq!(pneumo.category, "Pneumologie", "lowercase casing accepted");
    assert_eq!(pneumo.name, "Pneumologie (Juin 2024)", "no topic falls back to id");
}

#[tokio::test]
async fn malformed_bank_degrades_to_stub_entry_in_listing() {
    let dir = seed_data_dir();
    std::fs::write(dir.path().join("cassée.json"), "{ pas un tableau").unwrap();
    let store = FsBankStore::new(dir.path());

    let banks = store.list_banks().await.unwrap();
    let broken = banks.iter().find(|b| b.id.as_str() == "cassée").unwrap();
    assert_eq!(broken.question_count, 0);
    assert_eq!(broken.category, "Inconnu");
    assert!(broken.description.contains("erreur de lecture"));
}

#[tokio::test]
async fn get_questions_loads_and_normalizes() {
    let dir = seed_data_dir();
    let store = FsBankStore::new(dir.path());
    let id = BankId::new("Cardiologie (Février 2025)").unwrap();

    let questions = store.get_questions(&id, None).await.unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].prompt(), Some("Quel est le rythme normal ?"));
    assert_eq!(questions[0].choices().len(), 2);

    let filtered = store.get_questions(&id, Some("Juin 2024")).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].year_asked(), Some("Juin 2024"));
}

#[tokio::test]
async fn missing_bank_is_not_found_and_malformed_is_load_error() {
    let dir = seed_data_dir();
    std::fs::write(dir.path().join("cassée.json"), "[{").unwrap();
    let store = FsBankStore::new(dir.path());

    let missing = store
        .get_questions(&BankId::new("absente").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));

    let malformed = store
        .get_questions(&BankId::new("cassée").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(malformed, StorageError::Load(_)));
}

#[tokio::test]
async fn search_matches_category_and_ranks_by_score() {
    let dir = seed_data_dir();
    let store = FsBankStore::new(dir.path());

    let hits = store.search("cardio").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].summary.id.as_str(), "Cardiologie (Février 2025)");
    assert!(hits[0].match_score > 0);

    let none = store.search("dermatologie").await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn list_years_extracts_filename_labels_descending() {
    let dir = seed_data_dir();
    let store = FsBankStore::new(dir.path());

    let years = store.list_years().await.unwrap();
    assert_eq!(
        years,
        vec!["Février 2025".to_string(), "Juin 2024".to_string()]
    );
}

#[tokio::test]
async fn list_banks_by_year_filters_on_question_tags() {
    let dir = seed_data_dir();
    let store = FsBankStore::new(dir.path());

    let banks = store.list_banks_by_year("Juin 2024").await.unwrap();
    assert_eq!(banks.len(), 1);
    assert_eq!(banks[0].id.as_str(), "Cardiologie (Février 2025)");
    assert!(banks[0].description.contains("pour l'année Juin 2024"));
}

#[tokio::test]
async fn file_progress_store_round_trips_mastery() {
    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().join("state");
    let mastery = MasteryStore::new(Arc::new(FileProgressStore::new(&state_dir)));

    mastery
        .save(&MasterySnapshot {
            bank_fingerprint: "F1".to_string(),
            mastered_question_indices: vec![0, 2],
            saved_at: qcm_core::time::fixed_now(),
        })
        .await
        .unwrap();

    // A second store over the same directory sees the snapshot (process restart).
    let reopened = MasteryStore::new(Arc::new(FileProgressStore::new(&state_dir)));
    assert_eq!(reopened.load("F1").await.unwrap(), vec![0, 2]);
    assert!(reopened.load("F2").await.unwrap().is_empty());

    reopened.clear().await.unwrap();
    assert!(mastery.load("F1").await.unwrap().is_empty());
}

#[tokio::test]
async fn file_progress_store_get_before_first_write_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileProgressStore::new(dir.path().join("jamais-écrit"));
    assert!(store.get("clé").await.unwrap().is_none());
    store.remove("clé").await.unwrap();
}
