//! The operation catalog.
//!
//! Every operation follows the same pipeline:
//!
//! ```text
//! arguments ─► decode ─► resolve database ─► execute ─► shape ─► JSON
//! ```
//!
//! [`run`] drives that pipeline once for all operations; each operation only
//! supplies its input/output types, schemas, and an [`Operation::execute`]
//! that selects the collection, applies defaults, and calls the backend.
//!
//! | Operation | Class |
//! |-----------|-------|
//! | `list_collections`, `count_documents`, `find_one`, `find` | read |
//! | `insert_one`, `insert_many` | write |
//! | `update_one`, `update_many`, `find_one_and_update`, `find_one_and_replace` | write |
//! | `delete_one`, `delete_many`, `find_one_and_delete` | write |
//! | `aggregate` | aggregate |

/// Implement [`OperationInput`] for inputs with a `database_name` field.
macro_rules! operation_input {
    ($($input:ty),+ $(,)?) => {
        $(
            impl $crate::operations::OperationInput for $input {
                fn database_name(&self) -> Option<&str> {
                    self.database_name.as_deref()
                }
            }
        )+
    };
}

pub mod aggregate;
pub mod delete;
pub mod insert;
pub mod read;
pub mod schema;
pub mod update;

use crate::context::{ConnectionContext, Database};
use crate::error::OperationError;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

pub use aggregate::Aggregate;
pub use delete::{DeleteMany, DeleteOne, FindOneAndDelete};
pub use insert::{InsertMany, InsertOne};
pub use read::{CountDocuments, Find, FindOne, ListCollections};
pub use update::{FindOneAndReplace, FindOneAndUpdate, UpdateMany, UpdateOne};

/// Identity of every operation the server knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationId {
    ListCollections,
    CountDocuments,
    FindOne,
    Find,
    InsertOne,
    InsertMany,
    FindOneAndUpdate,
    FindOneAndReplace,
    UpdateOne,
    UpdateMany,
    DeleteOne,
    DeleteMany,
    FindOneAndDelete,
    Aggregate,
}

impl OperationId {
    pub const ALL: [OperationId; 14] = [
        OperationId::ListCollections,
        OperationId::CountDocuments,
        OperationId::FindOne,
        OperationId::Find,
        OperationId::InsertOne,
        OperationId::InsertMany,
        OperationId::FindOneAndUpdate,
        OperationId::FindOneAndReplace,
        OperationId::UpdateOne,
        OperationId::UpdateMany,
        OperationId::DeleteOne,
        OperationId::DeleteMany,
        OperationId::FindOneAndDelete,
        OperationId::Aggregate,
    ];

    /// Wire name used by `tools/list` and `tools/call`.
    pub fn name(self) -> &'static str {
        match self {
            OperationId::ListCollections => "list_collections",
            OperationId::CountDocuments => "count_documents",
            OperationId::FindOne => "find_one",
            OperationId::Find => "find",
            OperationId::InsertOne => "insert_one",
            OperationId::InsertMany => "insert_many",
            OperationId::FindOneAndUpdate => "find_one_and_update",
            OperationId::FindOneAndReplace => "find_one_and_replace",
            OperationId::UpdateOne => "update_one",
            OperationId::UpdateMany => "update_many",
            OperationId::DeleteOne => "delete_one",
            OperationId::DeleteMany => "delete_many",
            OperationId::FindOneAndDelete => "find_one_and_delete",
            OperationId::Aggregate => "aggregate",
        }
    }

    /// Human-readable display name.
    pub fn title(self) -> &'static str {
        match self {
            OperationId::ListCollections => "[MongoDB] List Collections Tool",
            OperationId::CountDocuments => "[MongoDB] Count Documents Tool",
            OperationId::FindOne => "[MongoDB] Find One Tool",
            OperationId::Find => "[MongoDB] Find Tool",
            OperationId::InsertOne => "[MongoDB] Insert One Tool",
            OperationId::InsertMany => "[MongoDB] Insert Many Tool",
            OperationId::FindOneAndUpdate => "[MongoDB] Find One and Update Tool",
            OperationId::FindOneAndReplace => "[MongoDB] Find One and Replace Tool",
            OperationId::UpdateOne => "[MongoDB] Update One Tool",
            OperationId::UpdateMany => "[MongoDB] Update Many Tool",
            OperationId::DeleteOne => "[MongoDB] Delete One Tool",
            OperationId::DeleteMany => "[MongoDB] Delete Many Tool",
            OperationId::FindOneAndDelete => "[MongoDB] Find One and Delete Tool",
            OperationId::Aggregate => "[MongoDB] Aggregate Tool",
        }
    }

    /// Whether the operation can change stored data.
    pub fn is_mutating(self) -> bool {
        !matches!(
            self,
            OperationId::ListCollections
                | OperationId::CountDocuments
                | OperationId::FindOne
                | OperationId::Find
                | OperationId::Aggregate
        )
    }

    /// Whether the operation removes or overwrites existing documents.
    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            OperationId::FindOneAndReplace
                | OperationId::DeleteOne
                | OperationId::DeleteMany
                | OperationId::FindOneAndDelete
        )
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Access to the database selector every input carries.
pub trait OperationInput {
    fn database_name(&self) -> Option<&str>;
}

/// One entry of the catalog: types, contract, and the backend call.
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    const ID: OperationId;

    type Input: DeserializeOwned + OperationInput + Send + 'static;
    type Output: Serialize + Send;

    fn description(&self) -> &'static str;

    fn input_schema(&self) -> Value;

    fn output_schema(&self) -> Value;

    /// Select the collection, apply defaults, call the backend, and shape
    /// the result. Backend errors are returned unchanged.
    async fn execute(
        &self,
        db: Database<'_>,
        input: Self::Input,
    ) -> Result<Self::Output, OperationError>;
}

/// Decode raw call arguments into an operation's typed input.
///
/// Missing or `null` arguments decode as an empty object, so operations
/// without required fields can be called bare.
pub fn decode<O: Operation>(arguments: Value) -> Result<O::Input, OperationError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| OperationError::InvalidInput {
        operation: O::ID.name().to_string(),
        reason: e.to_string(),
    })
}

/// Run an already decoded input through resolve, execute, and encode.
pub async fn run<O: Operation>(
    operation: &O,
    context: &ConnectionContext,
    input: O::Input,
) -> Result<Value, OperationError> {
    let db = context.database(input.database_name())?;
    tracing::debug!(operation = %O::ID, database = %db.name(), "Executing operation");

    let output = operation.execute(db, input).await?;
    Ok(serde_json::to_value(output)?)
}
