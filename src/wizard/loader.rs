use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::{Recommendation, Step, Target, WizardDocument};
use crate::errors::WizardError;

/// Reads, sanitizes and validates a wizard document from a YAML (or JSON)
/// file.
pub fn load_document(path: &Path) -> Result<WizardDocument, WizardError> {
    let content = fs::read_to_string(path).map_err(|e| {
        WizardError::Document(format!("could not read {}: {}", path.display(), e))
    })?;
    parse_document(&content)
}

pub fn parse_document(content: &str) -> Result<WizardDocument, WizardError> {
    let raw: WizardDocument = serde_yaml::from_str(content)?;
    let document = sanitize(raw);
    validate(&document)?;
    Ok(document)
}

/// Lower-cases ids and keeps `[a-z0-9_-]`, the same alphabet the slug
/// codec produces.
pub fn sanitize_key(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

fn sanitize(raw: WizardDocument) -> WizardDocument {
    let mut used_ids: HashSet<String> = HashSet::new();
    let mut counter = 1;
    let mut steps = Vec::with_capacity(raw.steps.len());

    for step in raw.steps {
        let mut id = sanitize_key(&step.id);
        if id.is_empty() {
            log::warn!("Dropping step '{}': its id has no usable characters.", step.title);
            continue;
        }
        while used_ids.contains(&id) {
            id = format!("step_{}", counter);
            counter += 1;
        }
        used_ids.insert(id.clone());

        let mut option_ids: HashSet<String> = HashSet::new();
        let options = step
            .options
            .into_iter()
            .filter_map(|mut option| {
                option.id = sanitize_key(&option.id);
                option.label = option.label.trim().to_string();
                if option.id.is_empty() || option.label.is_empty() || !option_ids.insert(option.id.clone()) {
                    log::warn!("Dropping option '{}' on step '{}'.", option.label, id);
                    return None;
                }
                option.target = match option.target {
                    Target::Step(target) => {
                        let clean = sanitize_key(&target);
                        if clean.is_empty() { Target::Sequential } else { Target::Step(clean) }
                    }
                    other => other,
                };
                let mut seen = HashSet::new();
                option.recommendations = option
                    .recommendations
                    .iter()
                    .map(|r| sanitize_key(r))
                    .filter(|r| !r.is_empty() && seen.insert(r.clone()))
                    .collect();
                Some(option)
            })
            .collect();

        steps.push(Step {
            id,
            title: step.title.trim().to_string(),
            description: step.description.filter(|d| !d.trim().is_empty()),
            options,
        });
    }

    let mut rec_ids: HashSet<String> = HashSet::new();
    let recommendations = raw
        .recommendations
        .into_iter()
        .filter_map(|rec| {
            let id = sanitize_key(&rec.id);
            if id.is_empty() || !rec_ids.insert(id.clone()) {
                log::warn!("Dropping recommendation '{}': missing or duplicate id.", rec.id);
                return None;
            }
            let mut seen = HashSet::new();
            let content_ids = rec
                .content_ids
                .into_iter()
                .filter(|cid| *cid > 0 && seen.insert(*cid))
                .collect();
            Some(Recommendation {
                id,
                title: rec.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
                content: rec.content.filter(|c| !c.trim().is_empty()),
                content_ids,
            })
        })
        .collect();

    WizardDocument {
        steps,
        recommendations,
        styles: raw.styles,
    }
}

/// Rejects authoring mistakes. A target naming a step that does not exist
/// is only logged: the engine treats it as the end of the path.
pub fn validate(document: &WizardDocument) -> Result<(), WizardError> {
    let mut problems = Vec::new();
    let step_ids: HashSet<&str> = document.steps.iter().map(|s| s.id.as_str()).collect();
    let rec_ids: HashSet<&str> = document.recommendations.iter().map(|r| r.id.as_str()).collect();

    let mut slugs = HashSet::new();
    for step in &document.steps {
        if step.title.is_empty() {
            problems.push(format!("step '{}' has no title", step.id));
        } else if !slugs.insert(step.slug()) {
            log::warn!(
                "Step '{}' title '{}' shares its URL key with an earlier step; restoring past it may stop early.",
                step.id, step.title
            );
        }
        if step.options.is_empty() {
            problems.push(format!("step '{}' has no options", step.id));
        }

        for option in &step.options {
            if option.target == Target::Recommendation && option.recommendations.is_empty() {
                problems.push(format!(
                    "step '{}' option '{}' jumps to the recommendation without selecting any",
                    step.id, option.id
                ));
            }
            for rec in &option.recommendations {
                if !rec_ids.contains(rec.as_str()) {
                    problems.push(format!(
                        "step '{}' option '{}' refers to unknown recommendation '{}'",
                        step.id, option.id, rec
                    ));
                }
            }
            if let Target::Step(target) = &option.target {
                if !step_ids.contains(target.as_str()) {
                    log::warn!(
                        "Step '{}' option '{}' targets unknown step '{}'; it will complete the wizard instead.",
                        step.id, option.id, target
                    );
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(WizardError::Authoring(problems))
    }
}
