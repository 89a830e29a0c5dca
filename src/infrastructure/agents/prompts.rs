//! Prompt templates for judgment and answer generation
//!
//! Templates use `${name}` placeholders filled with [`render`].

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::domain::{EvidenceSet, Provenance};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{(\w+)\}").unwrap());

pub const JUDGMENT_SYSTEM_PROMPT: &str = "Du vurderer om den givne kontekst er tilstrækkelig til \
at besvare et spørgsmål om det danske bygningsreglement. Du svarer kun med JSON.";

pub const JUDGMENT_PROMPT: &str = "Spørgsmål: ${query}

Kontekst:
${evidence}

Kan spørgsmålet besvares fyldestgørende alene ud fra konteksten? Svar med et JSON-objekt:
{\"verdict\": \"sufficient\" | \"insufficient\" | \"ambiguous\", \"rationale\": \"kort begrundelse\", \"confidence\": 0.0-1.0}";

pub const GENERATION_SYSTEM_PROMPT: &str = "Du er en hjælpsom assistent med ekspertise i det \
danske bygningsreglement (BR18). Svar på dansk, præcist og kun ud fra den givne kontekst. \
Henvis til kilderne med deres nummer i firkantede parenteser, f.eks. [1].";

pub const GENERATION_PROMPT: &str = "Brugeren stiller dig et spørgsmål, og du får givet en \
kontekst der kan hjælpe dig med at give et fyldestgørende svar.

# Kontekst
${evidence}

# Spørgsmål
${query}";

pub const HEDGED_GENERATION_PROMPT: &str = "Brugeren stiller dig et spørgsmål. Konteksten \
nedenfor er muligvis ufuldstændig eller kun delvist relevant. Giv dit bedste svar ud fra den, \
gør tydeligt opmærksom på hvad der er usikkert, og opfind ikke krav der ikke står i konteksten.

# Kontekst
${evidence}

# Spørgsmål
${query}";

/// Prefixed to every hedged answer
pub const HEDGE_NOTICE: &str = "Bemærk: Jeg fandt ikke tilstrækkeligt sikker information til \
at besvare spørgsmålet fuldt ud. Svaret nedenfor bygger på usikre eller ufuldstændige kilder \
og bør kontrolleres i bygningsreglementet.";

pub const NO_CONTEXT_ANSWER: &str = "Jeg kunne ikke finde tilstrækkelig information til at \
besvare dit spørgsmål i bygningsreglementet eller gennem web-søgning. Prøv venligst at \
omformulere dit spørgsmål eller være mere specifik om, hvilken del af bygningsreglementet du er \
interesseret i.";

pub const REFUSAL_ANSWER: &str = "Der er ikke tilstrækkeligt grundlag i de fundne kilder til at \
besvare spørgsmålet.";

/// Substitute `${key}` placeholders in one pass
///
/// Substituted values are never rescanned; unknown placeholders are left as is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Numbered context block, one entry per item, markers starting at 1
pub fn format_evidence(evidence: &EvidenceSet, limit: usize) -> String {
    evidence
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, item)| {
            let label = match item.provenance() {
                Provenance::Local => "Bygningsreglementet",
                Provenance::Web => "Web",
            };
            match item.title() {
                Some(title) => format!("[{}] ({}: {})\n{}", i + 1, label, title, item.content()),
                None => format!("[{}] ({})\n{}", i + 1, label, item.content()),
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
