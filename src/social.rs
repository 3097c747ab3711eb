//! Local social-sentiment scorer.
//!
//! Pure and deterministic: reads the `social_sentiment` fragment of the
//! context document and produces a [`SubscoreRecord`] without any remote call.
//! Sizes are log-compressed so very large communities do not dominate.

use serde_json::{json, Map, Value};

use crate::coerce::{clamp, round2, to_float, try_float};
use crate::contract::SubscoreRecord;

pub const FLAG_UNAVAILABLE: &str = "Social data unavailable";
pub const FLAG_LOW_REDDIT_SIZE: &str = "Low Reddit community size";
pub const FLAG_LOW_REDDIT_ACTIVITY: &str = "Low Reddit activity ratio";
pub const FLAG_NEGATIVE_BIAS: &str = "Negative sentiment bias";
pub const FLAG_STRONG_POSITIVE: &str = "Strong positive sentiment";

const NEUTRAL_VOTE_PCT: f64 = 50.0;

/// Raw inputs after coercion. Kept separate so derived scores are easy to test.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SocialInputs {
    reddit_subscribers: f64,
    reddit_active_48h: f64,
    up_pct: f64,
    down_pct: f64,
    votes_reported: bool,
    twitter_followers: f64,
}

impl SocialInputs {
    fn from_fragment(social: &Map<String, Value>) -> Self {
        let up = try_float(social.get("sentiment_votes_up_pct"));
        let down = try_float(social.get("sentiment_votes_down_pct"));
        Self {
            reddit_subscribers: to_float(social.get("reddit_subscribers"), 0.0).max(0.0),
            reddit_active_48h: to_float(social.get("reddit_active_accounts_48h"), 0.0).max(0.0),
            up_pct: clamp(up.unwrap_or(NEUTRAL_VOTE_PCT), 0.0, 100.0),
            down_pct: clamp(down.unwrap_or(NEUTRAL_VOTE_PCT), 0.0, 100.0),
            votes_reported: up.is_some() || down.is_some(),
            twitter_followers: to_float(social.get("twitter_followers"), 0.0).max(0.0),
        }
    }
}

fn log_size_score(count: f64, full_scale_decades: f64) -> f64 {
    clamp((count + 1.0).log10() / full_scale_decades * 100.0, 0.0, 100.0)
}

/// Score the `social_sentiment` fragment of a context document.
///
/// A missing or non-object fragment is treated as "no social data" and
/// scores neutral with low confidence.
pub fn score_social(ctx: &Value) -> SubscoreRecord {
    let empty = Map::new();
    let social = ctx
        .get("social_sentiment")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let inp = SocialInputs::from_fragment(social);

    let reddit_size_score = log_size_score(inp.reddit_subscribers, 6.0);
    let twitter_size_score = log_size_score(inp.twitter_followers, 7.0);

    let active_ratio = inp.reddit_active_48h / inp.reddit_subscribers.max(1.0);
    let active_score = clamp(active_ratio * 5000.0, 0.0, 100.0);

    let sentiment_delta = inp.up_pct - inp.down_pct;
    let sentiment_score = clamp(50.0 + sentiment_delta * 0.5, 0.0, 100.0);

    let has_reddit = inp.reddit_subscribers > 0.0;
    let has_votes = inp.votes_reported && (inp.up_pct + inp.down_pct) > 0.0;
    let has_twitter = inp.twitter_followers > 0.0;

    let (subscore, confidence, flags, explanation) = if !(has_reddit || has_votes || has_twitter)
    {
        (
            50.0,
            0.25,
            vec![FLAG_UNAVAILABLE.to_string()],
            "Social signals are unavailable, so a neutral social sentiment score was applied."
                .to_string(),
        )
    } else {
        let blended = 0.35 * reddit_size_score
            + 0.25 * active_score
            + 0.30 * sentiment_score
            + 0.10 * twitter_size_score;

        let mut confidence = 0.35;
        if has_reddit {
            confidence += 0.30;
        }
        if has_votes {
            confidence += 0.25;
        }
        if has_twitter {
            confidence += 0.10;
        }

        let mut flags = Vec::new();
        if inp.reddit_subscribers < 1000.0 {
            flags.push(FLAG_LOW_REDDIT_SIZE.to_string());
        }
        if has_reddit && active_ratio < 0.002 {
            flags.push(FLAG_LOW_REDDIT_ACTIVITY.to_string());
        }
        if sentiment_delta < -10.0 {
            flags.push(FLAG_NEGATIVE_BIAS.to_string());
        }
        if sentiment_delta > 25.0 {
            flags.push(FLAG_STRONG_POSITIVE.to_string());
        }

        let explanation = format!(
            "Social sentiment uses Reddit size/activity and vote sentiment (up {:.1}%, down {:.1}%).",
            inp.up_pct, inp.down_pct
        );
        (blended, clamp(confidence, 0.0, 0.95), flags, explanation)
    };

    let details = json!({
        "reddit_subscribers": inp.reddit_subscribers as u64,
        "reddit_active_accounts_48h": inp.reddit_active_48h as u64,
        "reddit_activity_ratio": (active_ratio * 1e6).round() / 1e6,
        "sentiment_votes_up_pct": round2(inp.up_pct),
        "sentiment_votes_down_pct": round2(inp.down_pct),
        "twitter_followers": inp.twitter_followers as u64,
        "reddit_size_score": round2(reddit_size_score),
        "activity_score": round2(active_score),
        "sentiment_score": round2(sentiment_score),
        "twitter_size_score": round2(twitter_size_score),
    });

    SubscoreRecord {
        subscore: round2(clamp(subscore, 0.0, 100.0)),
        confidence: round2(confidence),
        flags,
        explanation,
        details: match details {
            Value::Object(m) => m,
            _ => Map::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(social: Value) -> Value {
        json!({ "name": "Testcoin", "social_sentiment": social })
    }

    #[test]
    fn absent_social_data_is_neutral() {
        for doc in [json!({}), ctx(json!({})), ctx(Value::Null), ctx(json!("oops"))] {
            let rec = score_social(&doc);
            assert_eq!(rec.subscore, 50.0);
            assert_eq!(rec.confidence, 0.25);
            assert_eq!(rec.flags, vec![FLAG_UNAVAILABLE.to_string()]);
        }
    }

    #[test]
    fn explicit_zeros_are_unavailable_too() {
        let rec = score_social(&ctx(json!({
            "reddit_subscribers": 0,
            "reddit_active_accounts_48h": 0,
            "sentiment_votes_up_pct": 0,
            "sentiment_votes_down_pct": 0,
            "twitter_followers": 0
        })));
        assert_eq!(rec.subscore, 50.0);
        assert_eq!(rec.confidence, 0.25);
        assert_eq!(rec.flags, vec![FLAG_UNAVAILABLE.to_string()]);
    }

    #[test]
    fn large_positive_community_blend() {
        let rec = score_social(&ctx(json!({
            "reddit_subscribers": 2_000_000,
            "reddit_active_accounts_48h": 40_000,
            "sentiment_votes_up_pct": 80,
            "sentiment_votes_down_pct": 20,
            "twitter_followers": 0
        })));
        assert!((rec.subscore - 79.5).abs() < 1e-9, "subscore {}", rec.subscore);
        assert!((rec.confidence - 0.9).abs() < 1e-9);
        assert_eq!(rec.flags, vec![FLAG_STRONG_POSITIVE.to_string()]);
        assert_eq!(rec.details["reddit_size_score"], json!(100.0));
        assert_eq!(rec.details["activity_score"], json!(100.0));
        assert_eq!(rec.details["sentiment_score"], json!(65.0));
        assert_eq!(rec.details["twitter_size_score"], json!(0.0));
        assert_eq!(rec.details["reddit_activity_ratio"], json!(0.02));
    }

    #[test]
    fn small_quiet_bearish_community_raises_flags() {
        let rec = score_social(&ctx(json!({
            "reddit_subscribers": "500",
            "reddit_active_accounts_48h": 0,
            "sentiment_votes_up_pct": 30,
            "sentiment_votes_down_pct": 70,
            "twitter_followers": 1200
        })));
        assert!(rec.flags.contains(&FLAG_LOW_REDDIT_SIZE.to_string()));
        assert!(rec.flags.contains(&FLAG_LOW_REDDIT_ACTIVITY.to_string()));
        assert!(rec.flags.contains(&FLAG_NEGATIVE_BIAS.to_string()));
        assert!(!rec.flags.contains(&FLAG_STRONG_POSITIVE.to_string()));
        // all three signal groups present: 0.35 + 0.30 + 0.25 + 0.10, capped
        assert_eq!(rec.confidence, 0.95);
        assert!((0.0..=100.0).contains(&rec.subscore));
    }

    #[test]
    fn twitter_only_counts_as_signal() {
        let rec = score_social(&ctx(json!({ "twitter_followers": 10_000_000 })));
        assert!(!rec.flags.contains(&FLAG_UNAVAILABLE.to_string()));
        // no reddit: activity ratio is 0 but the low-activity flag is suppressed
        assert!(!rec.flags.contains(&FLAG_LOW_REDDIT_ACTIVITY.to_string()));
        assert_eq!(rec.details["reddit_activity_ratio"], json!(0.0));
        // twitter 7 decades ~ 100, votes default neutral 50 -> sentiment 50
        assert!((rec.subscore - 25.0).abs() < 0.01, "subscore {}", rec.subscore);
        assert_eq!(rec.confidence, 0.45);
    }

    #[test]
    fn absent_votes_earn_no_vote_confidence() {
        let rec = score_social(&ctx(json!({
            "reddit_subscribers": 1_000_000,
            "reddit_active_accounts_48h": 20_000
        })));
        // 0.35 base + 0.30 reddit; absent votes add nothing
        assert_eq!(rec.confidence, 0.65);
        assert_eq!(rec.details["sentiment_score"], json!(50.0));
    }

    #[test]
    fn vote_percentages_are_clamped() {
        let rec = score_social(&ctx(json!({
            "sentiment_votes_up_pct": 180,
            "sentiment_votes_down_pct": -20
        })));
        assert_eq!(rec.details["sentiment_votes_up_pct"], json!(100.0));
        assert_eq!(rec.details["sentiment_votes_down_pct"], json!(0.0));
        assert_eq!(rec.details["sentiment_score"], json!(100.0));
    }
}
