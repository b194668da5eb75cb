//! Interactive terminal front-end for a form
//!
//! Each prompt plays the part of a UI component: its answer goes through
//! the field's binding as a commit event, and only the controller decides
//! whether the form is accepted. After a rejected submit the wizard asks
//! again for the offending fields only.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Password, Select};
use miette::{IntoDiagnostic, Result};

use crate::core::binding::{FieldAdapter, FieldEvent, RawInput};
use crate::core::controller::{FormController, SubmitOutcome};
use crate::core::field::{FieldName, FieldValue};
use crate::core::values::FormValues;
use crate::schema::definition::{FieldSpec, FormDefinition};
use crate::schema::widget::Widget;

/// Prompts for a form's fields until the controller accepts them
pub struct FormWizard<'a> {
    definition: &'a FormDefinition,
    theme: ColorfulTheme,
    internal_message: String,
}

impl<'a> FormWizard<'a> {
    pub fn new(definition: &'a FormDefinition, internal_message: impl Into<String>) -> Self {
        Self {
            definition,
            theme: ColorfulTheme::default(),
            internal_message: internal_message.into(),
        }
    }

    /// Prompt for `fields`, submit, and re-prompt failing fields until accepted
    pub fn run(&self, controller: &mut FormController, fields: Vec<FieldName>) -> Result<FormValues> {
        println!();
        println!(
            "{} {}",
            style("◆").cyan(),
            style(&self.definition.title).bold()
        );
        if let Some(desc) = &self.definition.description {
            println!("  {}", style(desc).dim());
        }
        println!("{}", style("─".repeat(50)).dim());

        let mut pending = fields;
        loop {
            for name in &pending {
                let Some(spec) = self.definition.field(name) else {
                    continue;
                };
                self.prompt_field(controller, spec)?;
            }

            match controller.submit() {
                SubmitOutcome::Accepted(values) => {
                    println!();
                    println!("{} Form accepted", style("✓").green());
                    return Ok(values);
                }
                SubmitOutcome::Rejected(errors) => {
                    println!();
                    println!(
                        "{} {} field(s) need attention:",
                        style("✗").red(),
                        errors.len()
                    );
                    for error in errors.iter() {
                        let label = self
                            .definition
                            .field(&error.field)
                            .map(|f| f.label.as_str())
                            .unwrap_or(error.field.as_str());
                        let message = error.message.as_deref().unwrap_or(&self.internal_message);
                        println!("    {}: {}", style(label).bold(), style(message).red());
                    }
                    if errors.is_empty() {
                        return Err(miette::miette!(
                            "the schema rejected the form without naming a field"
                        ));
                    }
                    pending = errors.fields().cloned().collect();
                    // Re-prompt in form order
                    pending.sort_by_key(|f| {
                        self.definition
                            .fields
                            .iter()
                            .position(|s| &s.name == f)
                            .unwrap_or(usize::MAX)
                    });
                }
                SubmitOutcome::Ignored | SubmitOutcome::Discarded => {
                    return Err(miette::miette!("submit did not complete"));
                }
            }
        }
    }

    /// Prompt for one field and commit the answer through its binding
    fn prompt_field(&self, controller: &mut FormController, spec: &FieldSpec) -> Result<()> {
        let binding = controller
            .binding(&spec.name, &spec.widget)
            .ok_or_else(|| miette::miette!("field '{}' is not part of this form", spec.name))?;

        if let Some(error) = &binding.error {
            let message = error.message.as_deref().unwrap_or(&self.internal_message);
            println!("  {}", style(message).red());
        }

        let prompt = format_prompt(spec);
        let raw = self.ask(&spec.widget, &prompt, &binding.current_value)?;
        let event = binding.on_commit(raw);

        if let FieldEvent::Committed { update, .. } = &event {
            if update.validity == Some(false) {
                println!("  {}", style(&self.internal_message).yellow());
            }
        }
        controller.dispatch(event).into_diagnostic()
    }

    fn ask(&self, widget: &Widget, prompt: &str, current: &FieldValue) -> Result<RawInput> {
        let current_text = current.as_text().unwrap_or("").to_string();

        let raw = match widget {
            Widget::Text | Widget::Email => RawInput::Text(
                Input::<String>::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .with_initial_text(current_text)
                    .allow_empty(true)
                    .interact_text()
                    .into_diagnostic()?,
            ),

            Widget::Password => RawInput::Text(
                Password::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .allow_empty_password(true)
                    .interact()
                    .into_diagnostic()?,
            ),

            Widget::Date { format } => RawInput::Text(
                Input::<String>::with_theme(&self.theme)
                    .with_prompt(format!("{} [{}]", prompt, format))
                    .with_initial_text(current_text)
                    .allow_empty(true)
                    .interact_text()
                    .into_diagnostic()?,
            ),

            Widget::Select { options } => {
                let default_idx = options
                    .iter()
                    .position(|o| *o == current_text)
                    .unwrap_or(0);
                let selection = Select::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .items(options)
                    .default(default_idx)
                    .interact()
                    .into_diagnostic()?;
                RawInput::Text(options[selection].clone())
            }

            Widget::MultiSelect { options } => {
                let selected = current.as_list().unwrap_or(&[]);
                let defaults: Vec<bool> = options.iter().map(|o| selected.contains(o)).collect();
                let picks = MultiSelect::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .items(options)
                    .defaults(&defaults)
                    .interact()
                    .into_diagnostic()?;
                RawInput::Selected(picks.into_iter().map(|i| options[i].clone()).collect())
            }

            Widget::Checkbox => RawInput::Checked(
                Confirm::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .default(current.as_flag().unwrap_or(false))
                    .interact()
                    .into_diagnostic()?,
            ),
        };
        Ok(raw)
    }
}

/// Prompt text: the label, marked when required
fn format_prompt(spec: &FieldSpec) -> String {
    if spec.required {
        format!("{} *", spec.label)
    } else {
        spec.label.clone()
    }
}

/// Apply a `field=value` assignment through the field's widget
///
/// Used for values given up front instead of prompted for, so they get
/// the same component-native checks as typed input.
pub fn apply_raw(
    controller: &mut FormController,
    definition: &FormDefinition,
    field: &FieldName,
    raw: RawInput,
) -> Result<()> {
    let spec = definition
        .field(field)
        .ok_or_else(|| miette::miette!("form '{}' has no field '{}'", definition.name, field))?;
    let update = spec.widget.on_commit(&raw);
    controller
        .dispatch(FieldEvent::Committed {
            field: field.clone(),
            update,
        })
        .into_diagnostic()
}
