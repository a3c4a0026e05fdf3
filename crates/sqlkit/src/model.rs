//! Record mapping through explicit schema descriptors.
//!
//! A [`Model`] names its table and primary key and exposes its columns as a
//! [`Values`] map. The builders here turn that map into statements; decoding
//! rows back into the record is [`FromRow`](crate::FromRow)'s job.
//!
//! ```ignore
//! struct User { id: Option<i64>, name: String }
//!
//! impl Model for User {
//!     const TABLE: &'static str = "users";
//!     const PRIMARY_KEY: &'static [&'static str] = &["id"];
//!
//!     fn to_values(&self) -> Values {
//!         values! { "id" => self.id, "name" => self.name.as_str() }
//!     }
//!
//!     fn set_last_insert_id(&mut self, id: i64) -> OrmResult<()> {
//!         self.id = Some(id);
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::{OrmError, OrmResult};
use crate::qb::{DeleteQb, Expr, InsertQb, SelectQb, UpdateQb};
use crate::value::{Value, Values};

/// Schema descriptor for a record type.
pub trait Model {
    /// Table name.
    const TABLE: &'static str;

    /// Primary-key column(s).
    const PRIMARY_KEY: &'static [&'static str];

    /// Column → value view of the record.
    fn to_values(&self) -> Values;

    /// Store a key generated by the database on insert.
    ///
    /// The default rejects generated keys.
    fn set_last_insert_id(&mut self, id: i64) -> OrmResult<()> {
        Err(OrmError::validation(format!(
            "{} does not accept generated key {id}",
            Self::TABLE
        )))
    }
}

/// The single primary-key column left for the database to generate, if any.
///
/// That is the case when the model has exactly one key column and its value
/// is NULL or absent.
pub(crate) fn generated_key<M: Model>(values: &Values) -> Option<&'static str> {
    match M::PRIMARY_KEY {
        [pk] if values.get(*pk).is_none_or(Value::is_null) => Some(*pk),
        _ => None,
    }
}

fn key_filter<M: Model>(values: &Values) -> OrmResult<Vec<Expr>> {
    if M::PRIMARY_KEY.is_empty() {
        return Err(OrmError::validation(format!(
            "{} has no primary key",
            M::TABLE
        )));
    }
    M::PRIMARY_KEY
        .iter()
        .map(|pk| match values.get(*pk) {
            Some(v) if !v.is_null() => Ok(Expr::eq(*pk, v.clone())),
            _ => Err(OrmError::validation(format!(
                "{}: primary key column {pk} has no value",
                M::TABLE
            ))),
        })
        .collect()
}

/// INSERT for a record. A NULL generated key column is left out.
pub fn insert_model<M: Model>(model: &M) -> InsertQb {
    let mut values = model.to_values();
    if let Some(pk) = generated_key::<M>(&values) {
        values.remove(pk);
    }
    InsertQb::new(M::TABLE).values(values)
}

/// UPDATE of every non-key column, matched by primary key.
pub fn update_model<M: Model>(model: &M) -> OrmResult<UpdateQb> {
    let mut values = model.to_values();
    let keys = key_filter::<M>(&values)?;
    for pk in M::PRIMARY_KEY {
        values.remove(*pk);
    }
    Ok(keys
        .into_iter()
        .fold(UpdateQb::new(M::TABLE).values(values), UpdateQb::where_expr))
}

/// DELETE matched by primary key.
pub fn delete_model<M: Model>(model: &M) -> OrmResult<DeleteQb> {
    let keys = key_filter::<M>(&model.to_values())?;
    Ok(keys
        .into_iter()
        .fold(DeleteQb::new(M::TABLE), DeleteQb::where_expr))
}

/// `SELECT * ... WHERE pk = ?` with key values in `PRIMARY_KEY` order.
pub fn find_by_pk<M: Model>(key: Vec<Value>) -> OrmResult<SelectQb> {
    if key.len() != M::PRIMARY_KEY.len() || key.is_empty() {
        return Err(OrmError::validation(format!(
            "{} key has {} column(s), got {} value(s)",
            M::TABLE,
            M::PRIMARY_KEY.len(),
            key.len()
        )));
    }
    Ok(M::PRIMARY_KEY
        .iter()
        .zip(key)
        .fold(SelectQb::new(&[]).from(M::TABLE), |qb, (pk, v)| qb.eq(pk, v)))
}
