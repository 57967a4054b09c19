use regex::RegexBuilder;

use crate::data::ArticleMap;


/// Retains the articles whose title or body matches `term`, preserving the
/// map's key order.
///
/// An empty term returns the full map. The term is compiled as a
/// case-insensitive pattern; a term that is not a valid pattern is treated
/// as matching everything, so malformed user input shows the unfiltered
/// list instead of an error.
pub fn filter_articles(articles: &ArticleMap, term: &str) -> ArticleMap {
    if term.is_empty() {
        return articles.clone();
    }
    let matcher = match RegexBuilder::new(term).case_insensitive(true).build() {
        Ok(matcher) => matcher,
        Err(err) => {
            log::debug!("search term {term:?} is not a valid pattern ({err}), not filtering");
            return articles.clone();
        }
    };
    articles
        .iter()
        .filter(|(_, article)| matcher.is_match(&article.title) || matcher.is_match(&article.body))
        .map(|(id, article)| (id.clone(), article.clone()))
        .collect()
}
