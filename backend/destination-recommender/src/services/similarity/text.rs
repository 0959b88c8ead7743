use super::stopwords::is_stop_word;
use super::SimilarityModel;
use crate::error::{RecommendError, Result};
use crate::utils::normalize_vector;
use ndarray::{Array1, Array2};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// TF-IDF vector space over destination descriptions.
///
/// - Tokens: lowercased runs of alphanumeric/underscore characters, length >= 2
/// - Vocabulary: the `max_features` most frequent non-stop-word terms in the corpus
/// - Weights: raw term counts times smoothed idf `ln((1 + n) / (1 + df)) + 1`,
///   L2-normalized per document
#[derive(Debug, Clone)]
pub struct TextSimilarityModel {
    max_features: usize,
    vocabulary: HashMap<String, usize>,
    idf: Array1<f64>,
    documents: Array2<f64>,
    fitted: bool,
}

impl Default for TextSimilarityModel {
    fn default() -> Self {
        Self::new(500)
    }
}

impl TextSimilarityModel {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: HashMap::new(),
            idf: Array1::zeros(0),
            documents: Array2::zeros((0, 0)),
            fitted: false,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    /// Cosine similarity of `phrase` against every fitted description.
    pub fn similarity(&self, phrase: &str) -> Result<Array1<f64>> {
        let prepared = self.prepare(phrase)?;
        Ok(Array1::from_iter(
            (0..self.documents.nrows()).map(|index| self.similarity_at(&prepared, index)),
        ))
    }

    /// Weighted, normalized term vector in the fitted vocabulary.
    /// Out-of-vocabulary terms are dropped.
    fn vectorize(&self, text: &str) -> Array1<f64> {
        let mut vector = Array1::<f64>::zeros(self.vocabulary.len());
        for token in tokenize(text) {
            if let Some(&column) = self.vocabulary.get(&token) {
                vector[column] += 1.0;
            }
        }
        vector *= &self.idf;
        normalize_vector(&mut vector);
        vector
    }
}

impl SimilarityModel for TextSimilarityModel {
    type Corpus = [String];
    type Query = str;
    type Prepared = Array1<f64>;

    fn fit(&mut self, descriptions: &[String]) -> Result<()> {
        self.fitted = false;

        if descriptions.is_empty() {
            return Err(RecommendError::NoDataAvailable);
        }

        let tokenized: Vec<Vec<String>> = descriptions
            .iter()
            .map(|d| {
                tokenize(d)
                    .into_iter()
                    .filter(|t| !is_stop_word(t))
                    .collect()
            })
            .collect();

        let mut term_frequency: HashMap<&str, usize> = HashMap::new();
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for tokens in &tokenized {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in tokens {
                *term_frequency.entry(token.as_str()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *document_frequency.entry(token.as_str()).or_insert(0) += 1;
                }
            }
        }

        // Most frequent terms first, ties by term
        let mut ranked: Vec<(&str, usize)> = term_frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        // Column order is alphabetical so the layout is stable across fits
        let selected: BTreeMap<&str, usize> = ranked
            .iter()
            .map(|(term, _)| (*term, document_frequency.get(term).copied().unwrap_or(1)))
            .collect();

        let n_docs = descriptions.len() as f64;
        let mut vocabulary = HashMap::with_capacity(selected.len());
        let mut idf = Array1::<f64>::zeros(selected.len());
        for (column, (term, df)) in selected.iter().enumerate() {
            vocabulary.insert((*term).to_string(), column);
            idf[column] = ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0;
        }

        let mut documents = Array2::<f64>::zeros((descriptions.len(), vocabulary.len()));
        for (row, tokens) in tokenized.iter().enumerate() {
            let mut vector = Array1::<f64>::zeros(vocabulary.len());
            for token in tokens {
                if let Some(&column) = vocabulary.get(token) {
                    vector[column] += 1.0;
                }
            }
            vector *= &idf;
            normalize_vector(&mut vector);
            documents.row_mut(row).assign(&vector);
        }

        debug!(
            documents = documents.nrows(),
            vocabulary = vocabulary.len(),
            "Text similarity model fitted"
        );

        self.vocabulary = vocabulary;
        self.idf = idf;
        self.documents = documents;
        self.fitted = true;
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn len(&self) -> usize {
        if self.fitted {
            self.documents.nrows()
        } else {
            0
        }
    }

    fn prepare(&self, phrase: &str) -> Result<Array1<f64>> {
        if !self.fitted {
            return Err(RecommendError::ModelNotTrained);
        }
        Ok(self.vectorize(phrase))
    }

    fn similarity_at(&self, prepared: &Array1<f64>, index: usize) -> f64 {
        if !self.fitted || index >= self.documents.nrows() || prepared.len() != self.idf.len() {
            return 0.0;
        }
        // Both sides are unit length and non-negative
        self.documents.row(index).dot(prepared).clamp(0.0, 1.0)
    }
}

pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(|token| token.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "High altitude trekking adventure to Everest base camp".to_string(),
            "Ancient temples and cultural heritage of the valley".to_string(),
            "Jungle safari with rhinos, tigers and rich wildlife".to_string(),
            "Lakeside town with adventure sports and paragliding".to_string(),
        ]
    }

    fn fitted() -> TextSimilarityModel {
        let mut model = TextSimilarityModel::new(500);
        model.fit(&corpus()).unwrap();
        model
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Rhinos, tigers & a jungle-safari!"),
            vec!["rhinos", "tigers", "jungle", "safari"]
        );
    }

    #[test]
    fn test_stop_words_excluded_from_vocabulary() {
        let model = fitted();
        assert!(model.contains_term("trekking"));
        assert!(!model.contains_term("the"));
        assert!(!model.contains_term("and"));
    }

    #[test]
    fn test_vocabulary_cap() {
        let mut model = TextSimilarityModel::new(3);
        model.fit(&corpus()).unwrap();
        assert_eq!(model.vocabulary_size(), 3);
        // "adventure" is the only term appearing twice
        assert!(model.contains_term("adventure"));
    }

    #[test]
    fn test_similarity_ranks_matching_description() {
        let model = fitted();
        let scores = model.similarity("wildlife wildlife safari").unwrap();

        assert_eq!(scores.len(), 4);
        assert!(scores[2] > 0.0);
        assert_eq!(scores[1], 0.0);
        for score in scores.iter() {
            assert!((0.0..=1.0).contains(score));
        }
    }

    #[test]
    fn test_rare_term_outweighs_common_term() {
        let model = fitted();
        let scores = model.similarity("adventure everest").unwrap();
        // Both docs contain "adventure"; only the first contains the rarer "everest"
        assert!(scores[0] > scores[3]);
    }

    #[test]
    fn test_empty_and_stop_word_queries_yield_zero() {
        let model = fitted();
        assert!(model.similarity("").unwrap().iter().all(|s| *s == 0.0));
        assert!(model.similarity("the and of").unwrap().iter().all(|s| *s == 0.0));
        assert!(model.similarity("submarine").unwrap().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_identical_text_scores_one() {
        let model = fitted();
        let scores = model.similarity(&corpus()[1]).unwrap();
        assert!((scores[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_query_before_fit() {
        let model = TextSimilarityModel::default();
        assert!(matches!(
            model.similarity("trekking"),
            Err(RecommendError::ModelNotTrained)
        ));
    }

    #[test]
    fn test_fit_empty_corpus() {
        let mut model = TextSimilarityModel::default();
        assert!(matches!(model.fit(&[]), Err(RecommendError::NoDataAvailable)));
    }

    #[test]
    fn test_all_blank_descriptions() {
        let mut model = TextSimilarityModel::default();
        model.fit(&[String::new(), String::new()]).unwrap();
        assert_eq!(model.vocabulary_size(), 0);
        assert!(model.similarity("trekking").unwrap().iter().all(|s| *s == 0.0));
    }
}
