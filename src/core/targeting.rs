//! Validation and application of person-scoped advice mutations.
//!
//! Validation never fails loudly: it reports every problem it finds.
//! Application is a pure function over a cloned parameter set and is
//! best-effort for descriptors that were never validated.

use serde::Serialize;
use thiserror::Error;

use super::types::{
    AdviceItem, EntityChange, HouseholdParams, IncomeSource, IncomeSourcePatch, Person,
    PersonPatch, PersonSpecificChanges, SuperAccount, SuperAccountPatch,
};

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TargetingError {
    #[error("person {person_id} does not exist")]
    UnknownPerson { person_id: String },

    #[error("advice targets {advice_person} but its changes target {change_person}")]
    PersonMismatch {
        advice_person: String,
        change_person: String,
    },

    #[error("income source {id} does not belong to person {person_id}")]
    UnknownIncomeSource { person_id: String, id: String },

    #[error("super account {id} does not belong to person {person_id}")]
    UnknownSuperAccount { person_id: String, id: String },

    #[error("added {entity} {id} is already present for person {person_id}")]
    DuplicateEntity {
        entity: &'static str,
        person_id: String,
        id: String,
    },

    #[error("added {entity} {id} names person {found} instead of {expected}")]
    ConflictingPersonId {
        entity: &'static str,
        id: String,
        expected: String,
        found: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<TargetingError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<TargetingError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Person-owned sub-entity addressed by id.
trait Owned {
    const KIND: &'static str;
    fn id(&self) -> &str;
    fn owner(&self) -> Option<&str>;
}

impl Owned for IncomeSource {
    const KIND: &'static str = "income source";
    fn id(&self) -> &str {
        &self.id
    }
    fn owner(&self) -> Option<&str> {
        self.person_id.as_deref()
    }
}

impl Owned for SuperAccount {
    const KIND: &'static str = "super account";
    fn id(&self) -> &str {
        &self.id
    }
    fn owner(&self) -> Option<&str> {
        self.person_id.as_deref()
    }
}

pub fn validate_person_target(item: &AdviceItem, params: &HouseholdParams) -> ValidationResult {
    let mut errors = Vec::new();

    if let Some(person_id) = &item.person_id {
        if params.person(person_id).is_none() {
            errors.push(TargetingError::UnknownPerson {
                person_id: person_id.clone(),
            });
        }
    }

    if let Some(changes) = &item.person_specific_changes {
        if let Some(advice_person) = &item.person_id {
            if advice_person != &changes.person_id {
                errors.push(TargetingError::PersonMismatch {
                    advice_person: advice_person.clone(),
                    change_person: changes.person_id.clone(),
                });
            }
        }
        match params.person(&changes.person_id) {
            Some(person) => validate_changes(person, changes, &mut errors),
            None if item.person_id.as_deref() == Some(changes.person_id.as_str()) => {}
            None => errors.push(TargetingError::UnknownPerson {
                person_id: changes.person_id.clone(),
            }),
        }
    }

    ValidationResult::from_errors(errors)
}

fn validate_changes(
    person: &Person,
    changes: &PersonSpecificChanges,
    errors: &mut Vec<TargetingError>,
) {
    check_entity_changes(
        person,
        &person.income_sources,
        &changes.income_sources,
        |id| TargetingError::UnknownIncomeSource {
            person_id: person.id.clone(),
            id,
        },
        errors,
    );
    check_entity_changes(
        person,
        &person.super_accounts,
        &changes.super_accounts,
        |id| TargetingError::UnknownSuperAccount {
            person_id: person.id.clone(),
            id,
        },
        errors,
    );
}

fn check_entity_changes<E: Owned, P>(
    person: &Person,
    existing: &[E],
    changes: &[EntityChange<E, P>],
    unknown: impl Fn(String) -> TargetingError,
    errors: &mut Vec<TargetingError>,
) {
    for change in changes {
        match change {
            EntityChange::Add { entity } => {
                if let Some(owner) = entity.owner() {
                    if owner != person.id {
                        errors.push(TargetingError::ConflictingPersonId {
                            entity: E::KIND,
                            id: entity.id().to_string(),
                            expected: person.id.clone(),
                            found: owner.to_string(),
                        });
                    }
                }
                if existing.iter().any(|e| e.id() == entity.id()) {
                    errors.push(TargetingError::DuplicateEntity {
                        entity: E::KIND,
                        person_id: person.id.clone(),
                        id: entity.id().to_string(),
                    });
                }
            }
            EntityChange::Update { id, .. } | EntityChange::Remove { id } => {
                if !existing.iter().any(|e| e.id() == id) {
                    errors.push(unknown(id.clone()));
                }
            }
        }
    }
}

/// Returns a copy of `params` with the advice's person-specific changes
/// applied to the targeted person only.
pub fn apply_person_target(params: &HouseholdParams, item: &AdviceItem) -> HouseholdParams {
    let mut updated = params.clone();
    let Some(changes) = &item.person_specific_changes else {
        return updated;
    };
    let Some(person) = updated
        .people
        .iter_mut()
        .find(|p| p.id == changes.person_id)
    else {
        return updated;
    };

    if let Some(patch) = &changes.person {
        apply_person_patch(person, patch);
    }
    let person_id = person.id.clone();
    apply_entity_changes(
        &mut person.income_sources,
        &changes.income_sources,
        |source: &mut IncomeSource| source.person_id = Some(person_id.clone()),
        apply_income_patch,
    );
    apply_entity_changes(
        &mut person.super_accounts,
        &changes.super_accounts,
        |account: &mut SuperAccount| account.person_id = Some(person_id.clone()),
        apply_super_patch,
    );
    updated
}

fn apply_person_patch(person: &mut Person, patch: &PersonPatch) {
    if let Some(name) = &patch.name {
        person.name = name.clone();
    }
    if let Some(age) = patch.current_age {
        person.current_age = age;
    }
    if let Some(age) = patch.retirement_age {
        person.retirement_age = age;
    }
}

fn apply_income_patch(source: &mut IncomeSource, patch: &IncomeSourcePatch) {
    if let Some(name) = &patch.name {
        source.name = name.clone();
    }
    if let Some(amount) = patch.annual_amount {
        source.annual_amount = amount;
    }
}

fn apply_super_patch(account: &mut SuperAccount, patch: &SuperAccountPatch) {
    if let Some(name) = &patch.name {
        account.name = name.clone();
    }
    if let Some(balance) = patch.balance {
        account.balance = balance;
    }
    if let Some(rate) = patch.contribution_rate {
        account.contribution_rate = rate;
    }
    if let Some(rate) = patch.return_rate {
        account.return_rate = rate;
    }
}

fn apply_entity_changes<E: Owned + Clone, P>(
    entities: &mut Vec<E>,
    changes: &[EntityChange<E, P>],
    adopt: impl Fn(&mut E),
    patch_entity: impl Fn(&mut E, &P),
) {
    for change in changes {
        match change {
            EntityChange::Add { entity } => {
                let mut entity = entity.clone();
                adopt(&mut entity);
                entities.push(entity);
            }
            EntityChange::Update { id, patch } => {
                if let Some(target) = entities.iter_mut().find(|e| e.id() == id) {
                    patch_entity(target, patch);
                }
            }
            EntityChange::Remove { id } => entities.retain(|e| e.id() != id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strategies::fixtures::couple;
    use crate::core::types::{AdviceCategory, Priority, ProjectedImpact};

    fn targeted(person_id: &str, changes: PersonSpecificChanges) -> AdviceItem {
        AdviceItem {
            id: "targeted".to_string(),
            category: AdviceCategory::Investment,
            priority: Priority::Medium,
            title: "Targeted".to_string(),
            description: String::new(),
            actions: Vec::new(),
            projected_impact: ProjectedImpact::default(),
            feasibility_score: 70.0,
            effectiveness_score: 60.0,
            person_id: Some(person_id.to_string()),
            person_specific_changes: Some(changes),
        }
    }

    fn rate_update(person_id: &str, account_id: &str, rate: f64) -> PersonSpecificChanges {
        let mut changes = PersonSpecificChanges::for_person(person_id);
        changes.super_accounts.push(EntityChange::Update {
            id: account_id.to_string(),
            patch: SuperAccountPatch {
                contribution_rate: Some(rate),
                ..SuperAccountPatch::default()
            },
        });
        changes
    }

    #[test]
    fn valid_update_passes() {
        let params = couple();
        let item = targeted("alex", rate_update("alex", "alex-super", 0.13));
        let result = validate_person_target(&item, &params);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn unknown_person_is_reported_once() {
        let params = couple();
        let item = targeted("jo", rate_update("jo", "alex-super", 0.13));
        let result = validate_person_target(&item, &params);
        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            vec![TargetingError::UnknownPerson {
                person_id: "jo".to_string()
            }]
        );
    }

    #[test]
    fn sub_entity_ids_must_belong_to_the_person() {
        let params = couple();
        let item = targeted("alex", rate_update("alex", "sam-super", 0.13));
        let result = validate_person_target(&item, &params);
        assert_eq!(
            result.errors,
            vec![TargetingError::UnknownSuperAccount {
                person_id: "alex".to_string(),
                id: "sam-super".to_string()
            }]
        );

        let mut changes = PersonSpecificChanges::for_person("sam");
        changes.income_sources.push(EntityChange::Remove {
            id: "missing".to_string(),
        });
        let result = validate_person_target(&targeted("sam", changes), &params);
        assert!(matches!(
            result.errors.as_slice(),
            [TargetingError::UnknownIncomeSource { .. }]
        ));
    }

    #[test]
    fn added_entities_must_not_name_another_person() {
        let params = couple();
        let mut changes = PersonSpecificChanges::for_person("alex");
        changes.income_sources.push(EntityChange::Add {
            entity: IncomeSource {
                id: "alex-bonus".to_string(),
                name: "Bonus".to_string(),
                annual_amount: 10_000.0,
                person_id: Some("sam".to_string()),
            },
        });
        let result = validate_person_target(&targeted("alex", changes), &params);
        assert!(matches!(
            result.errors.as_slice(),
            [TargetingError::ConflictingPersonId { found, .. }] if found == "sam"
        ));
    }

    #[test]
    fn mismatched_item_and_change_person_is_invalid() {
        let params = couple();
        let item = targeted("sam", rate_update("alex", "alex-super", 0.13));
        let result = validate_person_target(&item, &params);
        assert!(matches!(
            result.errors.as_slice(),
            [TargetingError::PersonMismatch { .. }]
        ));
    }

    #[test]
    fn apply_updates_only_the_targeted_account() {
        let params = couple();
        let item = targeted("alex", rate_update("alex", "alex-super", 0.13));
        let updated = apply_person_target(&params, &item);

        assert_eq!(updated.people[0].super_accounts[0].contribution_rate, 0.13);
        assert_eq!(updated.people[1], params.people[1]);
        assert_eq!(updated.loans, params.loans);
        assert_eq!(updated.expenses, params.expenses);

        let mut expected = params.clone();
        expected.people[0].super_accounts[0].contribution_rate = 0.13;
        assert_eq!(updated, expected);
    }

    #[test]
    fn apply_add_and_remove_adopt_target_person() {
        let params = couple();
        let mut changes = PersonSpecificChanges::for_person("sam");
        changes.income_sources.push(EntityChange::Add {
            entity: IncomeSource {
                id: "sam-rental".to_string(),
                name: "Rental".to_string(),
                annual_amount: 12_000.0,
                person_id: None,
            },
        });
        changes.income_sources.push(EntityChange::Remove {
            id: "sam-salary".to_string(),
        });
        changes.person = Some(PersonPatch {
            retirement_age: Some(67),
            ..PersonPatch::default()
        });

        let updated = apply_person_target(&params, &targeted("sam", changes));
        let sam = &updated.people[1];
        assert_eq!(sam.retirement_age, 67);
        assert_eq!(sam.income_sources.len(), 1);
        assert_eq!(sam.income_sources[0].id, "sam-rental");
        assert_eq!(sam.income_sources[0].person_id.as_deref(), Some("sam"));
        assert_eq!(updated.people[0], params.people[0]);
    }

    #[test]
    fn apply_for_unknown_person_is_a_no_op() {
        let params = couple();
        let item = targeted("jo", rate_update("jo", "alex-super", 0.13));
        assert_eq!(apply_person_target(&params, &item), params);
    }

    #[test]
    fn apply_leaves_input_untouched() {
        let params = couple();
        let snapshot = params.clone();
        let _ = apply_person_target(&params, &targeted("alex", rate_update("alex", "alex-super", 0.14)));
        assert_eq!(params, snapshot);
    }
}
