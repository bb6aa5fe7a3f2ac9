//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. When
//! migrations change the schema, regenerate them with `diesel print-schema`
//! or update them by hand.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Int8,
        username -> Varchar,
        /// Salted digest; never the plaintext.
        password -> Nullable<Varchar>,
        first_name -> Nullable<Varchar>,
        last_name -> Nullable<Varchar>,
        birth_day -> Nullable<Date>,
        created_date -> Nullable<Timestamptz>,
        modified_date -> Nullable<Timestamptz>,
        created_by -> Nullable<Varchar>,
        modified_by -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Postal addresses owned by a user.
    addresses (id) {
        id -> Int8,
        address_type -> Varchar,
        street -> Varchar,
        post_zip_code -> Varchar,
        province -> Nullable<Varchar>,
        city -> Varchar,
        country -> Varchar,
        user_id -> Nullable<Int8>,
        created_date -> Nullable<Timestamptz>,
        modified_date -> Nullable<Timestamptz>,
        created_by -> Nullable<Varchar>,
        modified_by -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Phone and email contacts owned by a user; both values are unique.
    contacts (id) {
        id -> Int8,
        contact_type -> Varchar,
        phone_number -> Nullable<Varchar>,
        email -> Nullable<Varchar>,
        user_id -> Nullable<Int8>,
        created_date -> Nullable<Timestamptz>,
        modified_date -> Nullable<Timestamptz>,
        created_by -> Nullable<Varchar>,
        modified_by -> Nullable<Varchar>,
    }
}

diesel::joinable!(addresses -> users (user_id));
diesel::joinable!(contacts -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, addresses, contacts);
