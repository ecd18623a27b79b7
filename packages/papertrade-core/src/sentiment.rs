//! Keyword-based headline sentiment.
//!
//! Matching is a case-insensitive substring test, so "upgrades" hits "upgrade".

use crate::types::RiskTag;
use serde::{Deserialize, Serialize};

/// Positive and negative keyword lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(
            &[
                "soar", "surge", "gain", "upgrade", "beat", "buy", "rise", "bullish", "positive",
            ],
            &[
                "drop", "cut", "miss", "downgrade", "sell", "bearish", "slump", "negative",
            ],
        )
    }
}

impl Lexicon {
    /// Build a lexicon from keyword slices. Keywords are lowercased.
    pub fn new(positive: &[&str], negative: &[&str]) -> Self {
        Self {
            positive: positive.iter().map(|w| w.to_lowercase()).collect(),
            negative: negative.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Keywords used by the portfolio map cards.
    pub fn portfolio_map() -> Self {
        Self::new(
            &["beat", "soar", "surge", "growth", "upgrade", "buy", "best", "record"],
            &["fall", "cut", "miss", "downgrade", "slump", "warning", "hit hard", "setback"],
        )
    }

    fn positive_hits(&self, text: &str) -> usize {
        self.positive.iter().filter(|w| text.contains(w.as_str())).count()
    }

    fn negative_hits(&self, text: &str) -> usize {
        self.negative.iter().filter(|w| text.contains(w.as_str())).count()
    }
}

/// Overall tone of a set of headlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    fn as_str(&self) -> &'static str {
        match self {
            Tone::Positive => "positive",
            Tone::Negative => "negative",
            Tone::Neutral => "neutral",
        }
    }
}

/// Score headlines one vote each: +1 if any positive keyword appears,
/// otherwise -1 if any negative keyword appears, otherwise 0.
pub fn headline_score<S: AsRef<str>>(headlines: &[S], lexicon: &Lexicon) -> i32 {
    headlines
        .iter()
        .map(|title| {
            let text = title.as_ref().to_lowercase();
            if lexicon.positive_hits(&text) > 0 {
                1
            } else if lexicon.negative_hits(&text) > 0 {
                -1
            } else {
                0
            }
        })
        .sum()
}

/// Count every keyword hit: +1 per positive keyword, -1 per negative keyword.
pub fn keyword_tally<S: AsRef<str>>(headlines: &[S], lexicon: &Lexicon) -> i32 {
    headlines
        .iter()
        .map(|title| {
            let text = title.as_ref().to_lowercase();
            lexicon.positive_hits(&text) as i32 - lexicon.negative_hits(&text) as i32
        })
        .sum()
}

/// Compare how many headlines contain positive versus negative keywords.
pub fn tone<S: AsRef<str>>(headlines: &[S], lexicon: &Lexicon) -> Tone {
    let mut positive = 0;
    let mut negative = 0;
    for title in headlines {
        let text = title.as_ref().to_lowercase();
        if lexicon.positive_hits(&text) > 0 {
            positive += 1;
        }
        if lexicon.negative_hits(&text) > 0 {
            negative += 1;
        }
    }

    if positive > negative {
        Tone::Positive
    } else if negative > positive {
        Tone::Negative
    } else {
        Tone::Neutral
    }
}

/// One-line summary of headline sentiment.
pub fn summarize_headlines<S: AsRef<str>>(headlines: &[S], lexicon: &Lexicon) -> String {
    if headlines.is_empty() {
        return "No headlines available.".to_string();
    }

    format!(
        "Recent news sentiment appears {}, based on {} headlines.",
        tone(headlines, lexicon).as_str(),
        headlines.len()
    )
}

/// Crowd pulse label for a headline score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crowd {
    Hype,
    Cold,
    Neutral,
}

impl Crowd {
    /// Hype above +2, Cold below -2.
    pub fn from_score(score: i32) -> Self {
        if score > 2 {
            Crowd::Hype
        } else if score < -2 {
            Crowd::Cold
        } else {
            Crowd::Neutral
        }
    }
}

/// Trade signal combining the day's move with headline sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongBuy,
    Buy,
    Sell,
    Hold,
    Neutral,
}

impl Signal {
    /// Classify by daily change percent and sentiment score.
    ///
    /// Rules are checked in order; a NaN change falls through to Neutral.
    pub fn classify(change_percent: f64, score: i32) -> Self {
        if change_percent > 2.0 && score > 2 {
            Signal::StrongBuy
        } else if change_percent > 1.0 && score > 1 {
            Signal::Buy
        } else if change_percent < -2.0 && score < -2 {
            Signal::Sell
        } else if score <= 0 && change_percent <= 0.0 {
            Signal::Hold
        } else {
            Signal::Neutral
        }
    }

    /// Confidence percentage shown with the signal.
    pub fn confidence(&self) -> u8 {
        match self {
            Signal::StrongBuy => 95,
            Signal::Buy => 85,
            Signal::Sell => 20,
            Signal::Hold => 40,
            Signal::Neutral => 60,
        }
    }
}

/// Risk from the size of the day's move: under 0.5% Low, under 1.5% Moderate.
pub fn change_risk(change_percent: f64) -> RiskTag {
    let change = change_percent.abs();
    if change < 0.5 {
        RiskTag::Low
    } else if change < 1.5 {
        RiskTag::Moderate
    } else {
        RiskTag::High
    }
}

/// Per-symbol sentiment card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentCard {
    pub symbol: String,
    pub change_percent: f64,
    /// Keyword tally over the headlines
    pub score: i32,
    pub crowd: Crowd,
    pub signal: Signal,
    pub confidence: u8,
    pub risk: RiskTag,
    pub summary: String,
}

impl SentimentCard {
    /// Score headlines with every keyword hit and derive the card labels.
    pub fn build<S: AsRef<str>>(
        symbol: &str,
        change_percent: f64,
        headlines: &[S],
        lexicon: &Lexicon,
    ) -> Self {
        let score = keyword_tally(headlines, lexicon);
        let signal = Signal::classify(change_percent, score);

        Self {
            symbol: symbol.trim().to_uppercase(),
            change_percent,
            score,
            crowd: Crowd::from_score(score),
            signal,
            confidence: signal.confidence(),
            risk: change_risk(change_percent),
            summary: summarize_headlines(headlines, lexicon),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline_score_one_vote_per_headline() {
        let lexicon = Lexicon::default();
        let headlines = [
            "Stock SOARS after earnings beat", // two positive words, one vote
            "Shares slump on weak outlook",
            "Company holds annual meeting",
            "Shares surge despite guidance cut", // positive wins
        ];
        assert_eq!(headline_score(&headlines, &lexicon), 1 - 1 + 0 + 1);
    }

    #[test]
    fn test_headline_score_empty() {
        let headlines: [&str; 0] = [];
        assert_eq!(headline_score(&headlines, &Lexicon::default()), 0);
    }

    #[test]
    fn test_keyword_tally_counts_every_hit() {
        let lexicon = Lexicon::portfolio_map();
        let headlines = ["Record growth as revenue beats", "Shares hit hard after warning"];
        // +3 (record, growth, beat) and -2 (hit hard, warning)
        assert_eq!(keyword_tally(&headlines, &lexicon), 1);
    }

    #[test]
    fn test_summarize_headlines() {
        let lexicon = Lexicon::portfolio_map();
        let none: [&str; 0] = [];
        assert_eq!(summarize_headlines(&none, &lexicon), "No headlines available.");

        let headlines = ["Profits soar", "Guidance cut", "Upgrade from broker"];
        assert_eq!(
            summarize_headlines(&headlines, &lexicon),
            "Recent news sentiment appears positive, based on 3 headlines."
        );

        let mixed = ["Profits soar", "Guidance cut"];
        assert_eq!(tone(&mixed, &lexicon), Tone::Neutral);
    }

    #[test]
    fn test_lexicon_lowercases_keywords() {
        let lexicon = Lexicon::new(&["MOON"], &["Crash"]);
        assert_eq!(headline_score(&["to the moon"], &lexicon), 1);
        assert_eq!(headline_score(&["market crash"], &lexicon), -1);
    }

    #[test]
    fn test_crowd_labels() {
        assert_eq!(Crowd::from_score(3), Crowd::Hype);
        assert_eq!(Crowd::from_score(2), Crowd::Neutral);
        assert_eq!(Crowd::from_score(-2), Crowd::Neutral);
        assert_eq!(Crowd::from_score(-3), Crowd::Cold);
    }

    #[test]
    fn test_signal_rules() {
        assert_eq!(Signal::classify(2.5, 3), Signal::StrongBuy);
        assert_eq!(Signal::classify(1.5, 2), Signal::Buy);
        // Strong move, only mildly positive news
        assert_eq!(Signal::classify(2.5, 2), Signal::Buy);
        assert_eq!(Signal::classify(-2.5, -3), Signal::Sell);
        assert_eq!(Signal::classify(-0.5, 0), Signal::Hold);
        assert_eq!(Signal::classify(0.5, 1), Signal::Neutral);
        assert_eq!(Signal::classify(f64::NAN, 5), Signal::Neutral);
        assert_eq!(Signal::StrongBuy.confidence(), 95);
        assert_eq!(Signal::Hold.confidence(), 40);
    }

    #[test]
    fn test_change_risk() {
        assert_eq!(change_risk(0.2), RiskTag::Low);
        assert_eq!(change_risk(-0.5), RiskTag::Moderate);
        assert_eq!(change_risk(1.49), RiskTag::Moderate);
        assert_eq!(change_risk(-3.0), RiskTag::High);
    }

    #[test]
    fn test_sentiment_card() {
        let headlines = ["Record growth as revenue beats", "Analysts upgrade after surge"];
        let card = SentimentCard::build("nvda", 2.4, &headlines, &Lexicon::portfolio_map());

        assert_eq!(card.symbol, "NVDA");
        assert_eq!(card.score, 5);
        assert_eq!(card.crowd, Crowd::Hype);
        assert_eq!(card.signal, Signal::StrongBuy);
        assert_eq!(card.confidence, 95);
        assert_eq!(card.risk, RiskTag::High);
    }
}
