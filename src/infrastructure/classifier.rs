//! Keyword-matching intent classifier

use crate::config::DEFAULT_FALLBACK_LABEL;
use crate::domain::services::{CollaboratorError, IntentClassifier};
use async_trait::async_trait;

/// Matches utterances against branch labels as plain keywords.
///
/// An exact match of the trimmed utterance wins, then the longest label the
/// utterance contains. Ties go to the first label in sorted order. Anything else maps
/// to the fallback label. Stateless, so one instance serves every session.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    fallback: String,
}

impl KeywordClassifier {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
        }
    }

    pub fn classify_sync(&self, utterance: &str, candidates: &[String]) -> String {
        let utterance = utterance.trim();
        let mut labels: Vec<&String> = candidates
            .iter()
            .filter(|label| !label.is_empty() && **label != self.fallback)
            .collect();
        labels.sort();

        if let Some(label) = labels.iter().find(|label| label.as_str() == utterance) {
            return label.to_string();
        }

        // Longest contained label, so "没有了" picks "没有" over "有"
        let mut best: Option<&String> = None;
        for label in labels {
            if utterance.contains(label.as_str())
                && best.is_none_or(|b| label.chars().count() > b.chars().count())
            {
                best = Some(label);
            }
        }
        best.cloned().unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_LABEL)
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(
        &self,
        utterance: &str,
        candidates: &[String],
    ) -> Result<String, CollaboratorError> {
        let label = self.classify_sync(utterance, candidates);
        log::debug!(target: "csbot::classifier", "{utterance:?} -> {label}");
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_beats_substring() {
        let classifier = KeywordClassifier::default();
        let candidates = labels(&["订单", "订单查询"]);
        assert_eq!(classifier.classify_sync(" 订单查询 ", &candidates), "订单查询");
        assert_eq!(classifier.classify_sync("我想查订单", &candidates), "订单");
    }

    #[test]
    fn longest_contained_label_wins() {
        let classifier = KeywordClassifier::default();
        let candidates = labels(&["有", "没有"]);
        assert_eq!(classifier.classify_sync("没有了，谢谢", &candidates), "没有");
        assert_eq!(classifier.classify_sync("有的", &candidates), "有");
    }

    #[test]
    fn unmatched_utterance_maps_to_fallback() {
        let classifier = KeywordClassifier::default();
        let candidates = labels(&["投诉", "意图识别失败"]);
        assert_eq!(classifier.classify_sync("你好", &candidates), "意图识别失败");
        assert_eq!(classifier.classify_sync("", &[]), "意图识别失败");
    }

    #[test]
    fn custom_fallback() {
        let classifier = KeywordClassifier::new("unknown");
        assert_eq!(classifier.classify_sync("hello", &labels(&["bye"])), "unknown");
    }

    #[tokio::test]
    async fn async_classify_delegates() {
        let classifier = KeywordClassifier::default();
        let label = classifier
            .classify("我要投诉快递", &labels(&["投诉", "订单"]))
            .await
            .unwrap();
        assert_eq!(label, "投诉");
    }
}
