use std::collections::BTreeSet;

use serde_json::{Map, Value, json};

use super::*;
use crate::model::MacroF1;
use crate::normalize::{AliasSources, Normalizer};

fn normalizer() -> Normalizer {
    Normalizer::new().expect("regex should compile")
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture should be an object, got {other}"),
    }
}

fn close(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|value| (value - expected).abs() < 1e-9)
}

fn models(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

#[test]
fn merge_by_model_unions_alias_shards() {
    let mut aliases = AliasSources::default();
    let merged = merge_by_model(
        object(json!({
            "gemini-3-pro": {"accuracy": {"mean": 0.5}},
            "gemini-3-pro-preview": {"accuracy": {"std_error": 0.1}, "total_samples": 10},
            "broken": [1, 2, 3]
        })),
        &mut aliases,
    );
    assert_eq!(merged.len(), 1);
    let record = &merged["gemini-3-pro"];
    assert_eq!(record["accuracy"], json!({"mean": 0.5, "std_error": 0.1}));
    assert_eq!(record["total_samples"], json!(10));
    assert_eq!(
        aliases.get("gemini-3-pro"),
        Some(vec!["gemini-3-pro-preview".to_string()])
    );
}

#[test]
fn multiple_choice_recomputes_per_disease_std_errors() {
    let file: multiple_choice::MultipleChoiceFile = serde_json::from_value(json!({
        "anatomical_robustness": {
            "gpt-5": {
                "accuracy": {"mean": 0.8, "std_error": 0.01},
                "f1_score": {"mean": "0.75", "std_error": null},
                "disease_details": [
                    {"disease": "03.早期胃癌", "accuracy": 0.9, "f1_score": 0.85},
                    "not a record"
                ],
                "total_samples": 20.0
            }
        },
        "diagnosis_regional_robustness": {
            "gpt-5": {
                "stomach": {
                    "location_name": "胃",
                    "accuracy": {"mean": 0.7, "per_disease": [0.6, 0.8, "bad"]},
                    "f1_score": {"mean": 0.65, "per_disease": [0.5, 0.7, 0.9]},
                    "total_samples": 30
                },
                "esophagus": {"location_name": "Esophagus"}
            }
        },
        "model_disease_results": {
            "gpt-5_early": {
                "model_name": "gpt-5",
                "disease_type": "03.早期胃癌",
                "detailed_results": {
                    "q1": {"解剖定位": {"is_correct": true}, "诊断": {"is_correct": true}},
                    "q2": {"解剖定位": {"is_correct": false}, "诊断": {"is_correct": 1}},
                    "q3": {"解剖定位": {"is_correct": null}},
                    "q4": {"解剖定位": {}}
                }
            }
        }
    }))
    .expect("fixture should deserialize");

    let mut aliases = AliasSources::default();
    let view = multiple_choice::transform(file, &normalizer(), &mut aliases);

    let anatomical = &view.anatomical["gpt-5"];
    assert!(close(anatomical.overall.accuracy_mean, 0.8));
    assert!(close(anatomical.overall.f1_mean, 0.75));
    assert_eq!(anatomical.overall.f1_std_error, None);
    assert_eq!(anatomical.overall.total_samples, Some(20));
    assert_eq!(anatomical.per_disease.len(), 1);
    let disease = &anatomical.per_disease[0];
    assert_eq!(disease.disease.as_deref(), Some("早期胃癌"));
    assert_eq!(disease.columns.disease_en.as_deref(), Some("Early gastric cancer"));
    assert!(
        close(disease.f1_std_error, 1.0 / 3.0),
        "a null grade counts as wrong, an absent one is skipped"
    );

    let regions = &view.diagnosis["gpt-5"].regions;
    let keys: Vec<&str> = regions.iter().map(|region| region.region_key.as_str()).collect();
    assert_eq!(keys, vec!["esophagus", "stomach"]);
    let esophagus = &regions[0];
    assert_eq!(esophagus.total_samples, 0);
    assert_eq!(esophagus.region_name_cn.as_deref(), Some("食管"));
    assert!(esophagus.per_disease.is_empty());

    let stomach = &regions[1];
    assert_eq!(stomach.region_name_en.as_deref(), Some("Stomach"));
    assert_eq!(stomach.total_samples, 30);
    assert_eq!(stomach.per_disease.len(), 3);
    assert_eq!(stomach.per_disease[2].index, 3);
    assert_eq!(stomach.per_disease[2].accuracy, None);
    assert!(close(stomach.per_disease[2].f1_score, 0.9));
    assert!(close(stomach.per_disease[2].f1_std_error, 0.0));
    assert_eq!(stomach.per_disease[0].f1_std_error, None);
}

#[test]
fn spatial_excludes_invalid_predictions_from_std_error() {
    let overall = object(json!({
        "gemini-3-pro-preview": {
            "miou": 0.5001, "recall_05": 0.4, "recall_075": "0.2", "total_questions": 12
        }
    }));
    let detail = object(json!({
        "run-1": {
            "model_name": "gemini-3-pro-preview",
            "disease_type": "03.早期胃癌",
            "overall_avg_iou": 0.4,
            "total_questions": 3,
            "valid_questions": 2,
            "invalid_questions": 1,
            "detailed_results": {
                "q1": {"病灶定位": {"iou": 0.2, "is_valid_prediction": true}},
                "q2": {"病变定位": {"iou": 0.6}},
                "q3": {"病灶定位": {"iou": 0.9, "is_valid_prediction": false}},
                "q4": {"病灶定位": {}, "病变定位": {"iou": 0.4}}
            }
        },
        "run-2": {"model_name": "gemini-3-pro-preview", "disease_type": ""},
        "run-3": {"model_name": "", "disease_type": "早期胃癌"}
    }));

    let mut aliases = AliasSources::default();
    let view = spatial::transform(overall, detail, &normalizer(), &mut aliases);

    let metrics = &view.overall["gemini-3-pro"];
    assert!(close(metrics.miou, 0.5001));
    assert!(close(metrics.recall_075, 0.2));
    assert_eq!(metrics.total_questions, Some(12));

    let rows = &view.per_disease["gemini-3-pro"];
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].disease_type.as_deref(), Some("早期胃癌"));
    assert!(close(rows[0].overall_avg_iou, 0.4));
    let expected = 0.2 / 3.0_f64.sqrt();
    assert!(
        (rows[0].overall_avg_iou_std_error - expected).abs() < 1e-9,
        "an empty 病灶定位 block falls back to 病变定位"
    );
    assert_eq!(rows[0].invalid_questions, Some(1));
    assert_eq!(
        aliases.get("gemini-3-pro"),
        Some(vec!["gemini-3-pro-preview".to_string()])
    );
}

fn comparison_fixture() -> comparison::ComparisonFile {
    serde_json::from_value(json!({
        "f1_scores": {
            "anatomical_location_disease_f1": {
                "03.早期胃癌": {
                    "physician_马丽云": 0.8, "Junior-02": 0.6, "gpt-5": 0.9, "Trainee-01": "n/a"
                }
            },
            "diagnosis_disease_f1": {},
            "macro_avg_f1": {"马丽云": 0.7, "Junior-02": {"anatomical": 0.5}}
        },
        "physician_results": {
            "p1": {
                "physician_name": "马丽云",
                "total_questions": 80,
                "by_question_type": {"解剖定位": {"total": 40}},
                "detailed_results": [
                    {"disease_type": "早期胃癌", "question_type": "解剖定位", "is_correct": true},
                    {"disease_type": "早期胃癌", "question_type": "解剖定位", "is_correct": false}
                ]
            },
            "Junior-02": {"total_questions": 60}
        },
        "model_results": {
            "gpt-5": {
                "total_questions": 100,
                "detailed_results": [
                    {"disease_type": "早期胃癌", "question_type": "解剖定位", "is_correct": true}
                ]
            }
        }
    }))
    .expect("fixture should deserialize")
}

#[test]
fn comparison_averages_cohort_members_with_equal_weight() {
    let view = comparison::transform(comparison_fixture(), &models(&["gpt-5"]), &normalizer());
    let physicians = &view.anatomical;

    assert!(!physicians.contains_key("gpt-5"));
    assert!(!physicians.contains_key("Trainee-01"), "non-numeric scores are skipped");

    let junior_01 = &physicians["Junior-01"];
    assert!(close(junior_01.per_disease_f1.get("早期胃癌").copied(), 0.8));
    assert!(close(junior_01.per_disease_std_error.get("早期胃癌").copied(), 0.5));
    assert_eq!(junior_01.sample_size, Some(40));
    assert_eq!(junior_01.macro_avg_f1, Some(MacroF1::Overall(0.7)));
    assert_eq!(junior_01.cohort, None);

    let junior_02 = &physicians["Junior-02"];
    assert_eq!(junior_02.sample_size, Some(60));
    assert!(junior_02.per_disease_std_error.is_empty());

    let average = &physicians["Junior Endoscopists(Avg)"];
    assert_eq!(average.cohort.as_deref(), Some("初级内窥镜医师"));
    assert!(close(average.per_disease_f1.get("早期胃癌").copied(), 0.7));
    assert!(close(average.per_disease_std_error.get("早期胃癌").copied(), 0.5));
    assert_eq!(average.sample_size, Some(100));
    let Some(MacroF1::ByKey(macro_f1)) = &average.macro_avg_f1 else {
        panic!("cohort macro F1 should be keyed");
    };
    assert!(close(macro_f1.get("overall").copied(), 0.7));
    assert!(close(macro_f1.get("anatomical").copied(), 0.5));
}

#[test]
fn comparison_keeps_macro_only_participants_per_task() {
    let view = comparison::transform(comparison_fixture(), &models(&["gpt-5"]), &normalizer());
    let physicians = &view.diagnosis;

    let junior_01 = &physicians["Junior-01"];
    assert!(junior_01.per_disease_f1.is_empty());
    assert_eq!(junior_01.sample_size, Some(80), "no diagnosis breakdown falls back to total");
    assert_eq!(junior_01.macro_avg_f1, Some(MacroF1::Overall(0.7)));
    assert!(physicians.contains_key("Junior Endoscopists(Avg)"));
}

#[test]
fn comparison_cohort_sample_sizes_saturate() {
    let file: comparison::ComparisonFile = serde_json::from_value(json!({
        "f1_scores": {
            "anatomical_location_disease_f1": {"早期胃癌": {"Junior-01": 0.8, "Junior-02": 0.6}}
        },
        "physician_results": {
            "Junior-01": {"total_questions": 9223372036854775807_i64},
            "Junior-02": {"total_questions": 9223372036854775807_i64}
        }
    }))
    .expect("fixture should deserialize");

    let view = comparison::transform(file, &models(&[]), &normalizer());
    let average = &view.anatomical["Junior Endoscopists(Avg)"];
    assert_eq!(average.sample_size, Some(i64::MAX));
}

#[test]
fn spatial_comparison_attaches_std_errors_and_averages() {
    let file: spatial_hvm::SpatialComparisonFile = serde_json::from_value(json!({
        "per_question_iou": {
            "physician_马丽云": {
                "details": [
                    {"disease_type": "早期胃癌", "iou": 0.2},
                    {"disease_type": "早期胃癌", "iou": 0.6, "is_valid_prediction": true},
                    {"disease_type": "早期胃癌", "iou": 0.9, "is_valid_prediction": false},
                    {"disease_type": "早期胃癌", "iou": "oops"}
                ]
            }
        },
        "participants": {
            "马丽云": {
                "type": "高年资",
                "metrics": {
                    "overall": {"mean_iou": 0.6, "total_questions": 10, "sample_size": 999},
                    "by_disease": {"03.早期胃癌": {"mean_iou": 0.5}}
                }
            },
            "Junior-02": {
                "type": "初级内窥镜医师",
                "metrics": {
                    "overall": {"miou": 0.4, "total_questions": "20"},
                    "by_disease": {"03.早期胃癌": {"mean_iou": 0.3, "std_error": 0.05}, "bad": 3}
                }
            },
            "gpt-5": {"type": "model", "metrics": {"overall": {"mean_iou": 0.9}}}
        }
    }))
    .expect("fixture should deserialize");

    let physicians = spatial_hvm::transform(file, &models(&["gpt-5"]), &normalizer());
    assert!(!physicians.contains_key("gpt-5"));

    let junior_01 = &physicians["Junior-01"];
    assert_eq!(junior_01.cohort.as_deref(), Some("高年资"));
    assert_eq!(junior_01.overall.sample_size, Some(10));
    assert!(!junior_01.overall.metrics.contains_key("sample_size"));
    let attached = junior_01.by_disease["03.早期胃癌"]["mean_iou_std_error"].as_f64();
    assert!(close(attached, 0.2));

    let junior_02 = &physicians["Junior-02"];
    assert_eq!(junior_02.overall.sample_size, Some(20));
    assert!(!junior_02.by_disease.contains_key("bad"));

    let average = &physicians["Junior Endoscopists(Avg)"];
    assert_eq!(average.cohort.as_deref(), Some("初级内窥镜医师"));
    assert!(close(average.overall.metrics["mean_iou"].as_f64(), 0.5));
    assert_eq!(average.overall.sample_size, Some(30));
    let disease = &average.by_disease["03.早期胃癌"];
    assert!(close(disease["mean_iou"].as_f64(), 0.4));
    assert!(close(disease["mean_iou_std_error"].as_f64(), 0.125));
}

#[test]
fn likert_groups_rows_and_adds_cohort_averages() {
    let file: likert::LikertFile = serde_json::from_value(json!({
        "by_question_and_disease_type": [
            {
                "question_type": "看图说话", "disease_type": "03.早期胃癌", "model_name": "马丽云",
                "participant_type": "初级内窥镜医师", "n_samples": 5,
                "维度1_语言表达与可读性_mean": 4.0, "维度1_语言表达与可读性_std": 0.5
            },
            {
                "question_type": "看图说话", "disease_type": "早期胃癌", "model_name": "Junior-02",
                "participant_type": "初级内窥镜医师", "n_samples": 3,
                "维度1_语言表达与可读性_mean": 3.0, "维度1_语言表达与可读性_std": 1.0
            },
            {
                "question_type": "看图说话", "disease_type": "早期胃癌",
                "model_name": "gemini-3-pro-preview", "participant_type": "模型", "n_samples": 8, "维度1_语言表达与可读性_mean": 4.5
            },
            {"question_type": "看图说话", "disease_type": "早期胃癌", "n_samples": 4},
            {
                "question_type": "后续建议", "disease_type": "早期胃癌",
                "model_name": "gpt-5", "n_samples": 0
            }
        ]
    }))
    .expect("fixture should deserialize");

    let blocks = likert::transform(file, &normalizer());
    assert_eq!(blocks.len(), 2);

    let findings = &blocks["看图说话"];
    assert_eq!(findings.question_type_en, "Findings");
    assert_eq!(findings.participant_sample_sizes["Junior-01"], 5);
    assert_eq!(findings.participant_sample_sizes["gemini-3-pro"], 8);
    assert_eq!(findings.participant_sample_sizes["Junior Endoscopists(Avg)"], 8);
    assert_eq!(findings.diseases.len(), 1, "labels with and without ordinals group together");

    let participants = &findings.diseases[0].participants;
    let names: Vec<&str> = participants
        .iter()
        .map(|participant| participant.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["gemini-3-pro", "Junior Endoscopists(Avg)", "Junior-02", "Junior-01"]
    );
    assert_eq!(participants[3].name_cn.as_deref(), Some("马丽云"));
    assert_eq!(participants[0].dimensions.len(), 5);

    let average = &participants[1];
    assert_eq!(average.name_cn.as_deref(), Some("初级内窥镜医师(平均)"));
    assert_eq!(average.participant_type.as_deref(), Some("初级内窥镜医师"));
    assert_eq!(average.sample_size, Some(8));
    assert_eq!(average.dimensions.len(), 1);
    let language = &average.dimensions["dimension1"];
    assert!(close(language.mean, 3.5));
    assert!(close(language.std, 0.75));

    let recommendations = &blocks["后续建议"];
    assert!(recommendations.participant_sample_sizes.is_empty());
    assert_eq!(recommendations.diseases[0].participants[0].sample_size, None);
}
