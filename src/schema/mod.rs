//! Form definitions, JSON Schema validation and the terminal front-end

pub mod definition;
pub mod registry;
pub mod template;
pub mod validator;
pub mod widget;
pub mod wizard;

pub use definition::{DefinitionError, FieldSpec, FormDefinition};
pub use registry::{FormRegistry, FormSource, RegisteredForm, RegistryError};
pub use template::{Receipt, ReceiptRenderer, TemplateError};
pub use validator::{SchemaError, SchemaValidator};
pub use widget::Widget;
pub use wizard::FormWizard;
