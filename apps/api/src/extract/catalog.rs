//! Keyword catalogs and word-boundary term scanning.
//!
//! Catalogs are ordered `const` tables so detection output is deterministic.
//! Aliases are matched case-insensitively on word boundaries ("java" never
//! fires inside "javascript").

use crate::models::profile::EducationLevel;

/// Canonical skill name → aliases as they appear in documents.
pub const SKILL_CATALOG: &[(&str, &[&str])] = &[
    ("python", &["python"]),
    ("java", &["java"]),
    ("javascript", &["javascript", "js"]),
    ("typescript", &["typescript", "ts"]),
    ("rust", &["rust"]),
    ("go", &["golang", "go"]),
    ("react", &["react"]),
    ("angular", &["angular"]),
    ("node.js", &["node.js", "nodejs", "node js"]),
    ("fastapi", &["fastapi"]),
    ("flask", &["flask"]),
    ("django", &["django"]),
    ("spring boot", &["spring boot"]),
    ("sql", &["sql", "postgresql", "mysql", "sqlite"]),
    ("mongodb", &["mongodb"]),
    ("docker", &["docker"]),
    ("kubernetes", &["kubernetes", "k8s"]),
    ("terraform", &["terraform"]),
    ("git", &["git", "github", "gitlab"]),
    ("linux", &["linux"]),
    ("aws", &["aws"]),
    ("azure", &["azure"]),
    ("gcp", &["gcp", "google cloud"]),
    ("tensorflow", &["tensorflow"]),
    ("pytorch", &["pytorch"]),
    ("machine learning", &["machine learning", "ml"]),
    ("deep learning", &["deep learning"]),
    ("nlp", &["nlp", "natural language processing"]),
    ("data analysis", &["data analysis", "analytics"]),
    ("power bi", &["power bi", "powerbi"]),
    ("excel", &["excel"]),
    ("scrum", &["scrum"]),
    ("agile", &["agile"]),
    ("devops", &["devops"]),
    ("ci/cd", &["ci/cd", "ci cd", "jenkins", "github actions"]),
];

/// Job titles recognized as roles.
pub const ROLE_CATALOG: &[(&str, &[&str])] = &[
    ("software engineer", &["software engineer", "software developer"]),
    ("backend engineer", &["backend engineer", "backend developer", "back-end developer"]),
    ("frontend engineer", &["frontend engineer", "frontend developer", "front-end developer"]),
    ("fullstack engineer", &["fullstack engineer", "full-stack developer", "fullstack developer"]),
    ("data engineer", &["data engineer"]),
    ("data scientist", &["data scientist"]),
    ("data analyst", &["data analyst"]),
    ("machine learning engineer", &["machine learning engineer", "ml engineer"]),
    ("devops engineer", &["devops engineer", "site reliability engineer", "sre"]),
    ("cloud architect", &["cloud architect", "solutions architect"]),
    ("project manager", &["project manager", "chef de projet"]),
    ("product manager", &["product manager"]),
    ("tech lead", &["tech lead", "technical lead", "lead developer"]),
    ("qa engineer", &["qa engineer", "test engineer", "quality assurance"]),
    ("business analyst", &["business analyst"]),
    ("consultant", &["consultant", "consultante"]),
];

/// Professional certifications.
pub const CERT_CATALOG: &[(&str, &[&str])] = &[
    ("aws certified solutions architect", &["aws certified solutions architect", "aws solutions architect"]),
    ("aws certified developer", &["aws certified developer"]),
    ("azure fundamentals", &["az-900", "azure fundamentals"]),
    ("google cloud professional", &["google cloud professional", "gcp professional"]),
    ("pmp", &["pmp", "project management professional"]),
    ("prince2", &["prince2"]),
    ("scrum master", &["certified scrum master", "csm", "psm", "scrum master certification"]),
    ("cissp", &["cissp"]),
    ("ceh", &["certified ethical hacker", "ceh"]),
    ("comptia security+", &["security+", "comptia security"]),
    ("ckad", &["ckad", "certified kubernetes application developer"]),
    ("cka", &["cka", "certified kubernetes administrator"]),
    ("itil", &["itil"]),
    ("togaf", &["togaf"]),
];

/// Spoken languages, with French aliases (bilingual tender corpora).
pub const LANGUAGE_CATALOG: &[(&str, &[&str])] = &[
    ("English", &["english", "anglais"]),
    ("French", &["french", "francais", "français"]),
    ("Arabic", &["arabic", "arabe"]),
    ("German", &["german", "allemand"]),
    ("Spanish", &["spanish", "espagnol"]),
];

/// Education levels, highest first so the best attainment wins.
pub const EDUCATION_CATALOG: &[(EducationLevel, &[&str])] = &[
    (EducationLevel::Phd, &["phd", "ph.d", "doctorate", "doctorat"]),
    (EducationLevel::Master, &["master", "msc", "m.sc", "engineer's degree", "ingénieur", "ingenieur"]),
    (EducationLevel::Bachelor, &["bachelor", "licence", "bsc", "b.sc"]),
];

/// Function words excluded from the keyword inventory (English + French).
pub const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "from", "have", "will", "your",
    "into", "their", "need", "must", "using", "about", "able", "more", "plus",
    "les", "des", "une", "pour", "avec", "dans", "sur", "aux", "par",
];

/// Section headers recognized when splitting a document into raw sections.
pub const SECTION_HEADERS: &[(&str, &[&str])] = &[
    ("summary", &["summary", "profile", "professional summary", "objective", "about me", "profil"]),
    ("experience", &["experience", "work experience", "professional experience", "employment history", "expérience", "experience professionnelle"]),
    ("education", &["education", "academic background", "formation"]),
    ("skills", &["skills", "technical skills", "competences", "compétences", "key skills"]),
    ("certifications", &["certifications", "certificates", "licenses"]),
    ("languages", &["languages", "langues"]),
    ("projects", &["projects", "personal projects", "projets"]),
    ("requirements", &["requirements", "required qualifications", "qualifications", "exigences"]),
];

/// A catalog term found in a document: the canonical name, the surface form as
/// written, and the byte offset of its first occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct TermHit {
    pub canonical: String,
    pub surface: String,
    pub position: usize,
}

/// Scans `text` for every catalog entry. One hit per canonical term, at the
/// earliest alias occurrence; hits are returned in reading order.
pub fn detect_terms(text: &str, catalog: &[(&str, &[&str])]) -> Vec<TermHit> {
    let lowered = text.to_ascii_lowercase();
    let mut hits = Vec::new();

    for (canonical, aliases) in catalog {
        let mut earliest: Option<(usize, usize)> = None; // (position, alias byte length)
        for alias in *aliases {
            if let Some(pos) = find_term(&lowered, alias) {
                if earliest.map_or(true, |(e, _)| pos < e) {
                    earliest = Some((pos, alias.len()));
                }
            }
        }
        if let Some((position, len)) = earliest {
            // ASCII lowercasing preserves byte offsets, so the original-case
            // slice lines up exactly with the match in `lowered`.
            hits.push(TermHit {
                canonical: (*canonical).to_string(),
                surface: text[position..position + len].to_string(),
                position,
            });
        }
    }

    hits.sort_by(|a, b| a.position.cmp(&b.position).then(a.canonical.cmp(&b.canonical)));
    hits
}

/// First word-boundary occurrence of `term` in (lowercased) `haystack`.
fn find_term(haystack: &str, term: &str) -> Option<usize> {
    for (pos, _) in haystack.match_indices(term) {
        let before_ok = haystack[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let after_ok = haystack[pos + term.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            return Some(pos);
        }
    }
    None
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True when `text` contains `term` on word boundaries, case-insensitively.
pub fn contains_term(text: &str, term: &str) -> bool {
    find_term(&text.to_ascii_lowercase(), &term.to_ascii_lowercase()).is_some()
}

/// Deduplicates case-insensitively, keeping the first occurrence's case.
pub fn dedup_preserve_first_case(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        if seen.insert(value.to_lowercase()) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_does_not_match_inside_javascript() {
        assert!(!contains_term("Senior JavaScript developer", "java"));
        assert!(contains_term("Java and JavaScript developer", "java"));
    }

    #[test]
    fn test_detect_terms_is_deterministic_and_ordered() {
        let text = "Docker, Kubernetes and docker again; also Python.";
        let a = detect_terms(text, SKILL_CATALOG);
        let b = detect_terms(text, SKILL_CATALOG);
        assert_eq!(a, b);

        let canonicals: Vec<&str> = a.iter().map(|h| h.canonical.as_str()).collect();
        assert_eq!(canonicals, vec!["docker", "kubernetes", "python"]);
    }

    #[test]
    fn test_detect_terms_one_hit_per_canonical() {
        let hits = detect_terms("PostgreSQL and MySQL and SQLite", SKILL_CATALOG);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].canonical, "sql");
    }

    #[test]
    fn test_k8s_alias_maps_to_kubernetes() {
        let hits = detect_terms("we deploy on k8s", SKILL_CATALOG);
        assert_eq!(hits[0].canonical, "kubernetes");
    }

    #[test]
    fn test_dedup_preserves_first_case() {
        let deduped = dedup_preserve_first_case(vec![
            "Python".to_string(),
            "python".to_string(),
            "SQL".to_string(),
            "sql".to_string(),
        ]);
        assert_eq!(deduped, vec!["Python".to_string(), "SQL".to_string()]);
    }

    #[test]
    fn test_education_catalog_highest_first() {
        assert_eq!(EDUCATION_CATALOG[0].0, EducationLevel::Phd);
    }
}
