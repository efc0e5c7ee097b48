pub mod configuration;
pub mod environment;
pub mod error;
pub mod values;
pub mod version1;

pub use configuration::{
    make_runtime_configuration, CompletionSettings, Configuration, PromptOptions, SchemaSettings,
};
pub use environment::{Environment, FixedEnvironment, ProcessEnvironment, Variable};
pub use error::{ConfigurationError, ParseConfigurationError, WriteParsedConfigurationError};
pub use values::{PoolSettings, Secret};
pub use version1::{
    configuration_schema, parse_configuration, write_parsed_configuration, ParsedConfiguration,
    CONFIGURATION_FILENAME,
};
