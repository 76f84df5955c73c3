//! Property tests for context assembly and answer checking.

use lost_in_middle::context::build_context;
use lost_in_middle::evaluator::{check_answer, extract_answer, normalize, numbers};
use lost_in_middle::qa::{DistractorPool, QaRecord};
use proptest::prelude::*;

fn pool_of(n: usize) -> DistractorPool {
    DistractorPool::new((0..n).map(|i| format!("Filler passage number {} about nothing.", i)))
}

fn record(hard: usize) -> QaRecord {
    QaRecord::new("q1", "What is the capital of Valdoria?", "Zentrix", "Its capital is Zentrix.")
        .with_hard_distractors((0..hard).map(|i| format!("Hard passage {} naming Northgate.", i)))
}

/// (total_docs, gold_position) with the position in range.
fn placement() -> impl Strategy<Value = (usize, usize)> {
    (1usize..60).prop_flat_map(|total| (Just(total), 1..=total))
}

proptest! {
    #[test]
    fn context_has_numbered_documents_and_gold_in_place(
        (total, gold) in placement(),
        hard in 0usize..6,
        pool_size in 1usize..40,
        seed in any::<u64>(),
    ) {
        let qa = record(hard);
        let context = build_context(&qa, &pool_of(pool_size), gold, total, seed).unwrap();
        let rendered = context.render();

        prop_assert_eq!(context.len(), total);
        prop_assert_eq!(rendered.matches("Document ").count(), total);
        for i in 1..=total {
            let label = format!("Document {}: ", i);
            prop_assert_eq!(rendered.matches(label.as_str()).count(), 1);
        }
        prop_assert_eq!(context.document(gold), Some(qa.gold_doc.as_str()));
        let gold_line = format!("Document {}: {}", gold, qa.gold_doc);
        prop_assert!(rendered.contains(&gold_line));
        prop_assert_eq!(rendered.matches(qa.gold_doc.as_str()).count(), 1);
    }

    #[test]
    fn context_is_deterministic(
        (total, gold) in placement(),
        hard in 0usize..6,
        pool_size in 1usize..40,
        seed in any::<u64>(),
    ) {
        let qa = record(hard);
        let pool = pool_of(pool_size);
        let first = build_context(&qa, &pool, gold, total, seed).unwrap();
        let second = build_context(&qa, &pool, gold, total, seed).unwrap();
        prop_assert_eq!(first.render(), second.render());
    }

    #[test]
    fn different_seeds_reorder_distractors(
        total in 6usize..30,
        gold_offset in 0usize..30,
        seed in 0u64..u64::MAX,
    ) {
        let gold = gold_offset % total + 1;
        let qa = record(0);
        let pool = pool_of(50);
        let first = build_context(&qa, &pool, gold, total, seed).unwrap();
        let second = build_context(&qa, &pool, gold, total, seed + 1).unwrap();

        prop_assert_eq!(second.document(gold), Some(qa.gold_doc.as_str()));
        prop_assert_ne!(first.render(), second.render());
    }

    #[test]
    fn extraction_is_idempotent(response in "\\PC{0,60}") {
        let once = extract_answer(&response);
        prop_assert_eq!(extract_answer(&once), once);
    }

    #[test]
    fn lead_in_and_punctuation_do_not_change_the_verdict(
        answer in "[A-Z][a-z]{2,10}( [A-Z][a-z]{2,10})?",
        lead in prop::sample::select(vec!["", "The answer is ", "Answer: ", "Based on the documents, "]),
        tail in prop::sample::select(vec!["", ".", ";", " ."]),
    ) {
        let response = format!("{}{}{}", lead, answer, tail);
        let (correct, extracted) = check_answer(&response, &answer);
        prop_assert!(correct);
        prop_assert_eq!(extracted, answer.clone());
        prop_assert_eq!(check_answer(&response, &answer), (correct, answer));
    }

    #[test]
    fn verdict_on_extracted_answer_matches_verdict_on_response(
        lead in prop::sample::select(vec!["", "The answer is ", "Answer: ", "Based on the documents, the answer is "]),
        name in "(Dr\\. |St\\. |Mt\\. )?[A-Z][a-z]{2,8}( [A-Z][a-z]{2,8})?",
        clause in prop::sample::select(vec!["", ", not Northgate", ", but the real answer is 1342", " since 2023"]),
        tail in prop::sample::select(vec!["", ".", ";", " ."]),
        gold in prop::sample::select(vec!["Maria Thornberg", "Northgate", "1342", "2023"]),
    ) {
        let response = format!("{}{}{}{}", lead, name, clause, tail);
        let extracted = extract_answer(&response);

        prop_assert_eq!(check_answer(&extracted, gold).0, check_answer(&response, gold).0);
        prop_assert_eq!(check_answer(&extracted, &name).0, check_answer(&response, &name).0);
    }

    #[test]
    fn comma_grouping_does_not_change_numbers(n in 1000u64..10_000_000) {
        let plain = n.to_string();
        let mut grouped = String::new();
        for (i, c) in plain.chars().enumerate() {
            if i > 0 && (plain.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        prop_assert_eq!(numbers(&normalize(&grouped)), numbers(&normalize(&plain)));
        prop_assert!(check_answer(&grouped, &plain).0);
        prop_assert!(check_answer(&plain, &grouped).0);
    }
}
