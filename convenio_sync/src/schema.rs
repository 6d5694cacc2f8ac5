//! Diesel table definitions for the reference schema.

// Mirrors migrations/2025-09-01-000000_reference_schema.
#![allow(missing_docs)]

diesel::table! {
    convenios (id) {
        id -> BigInt,
        nome -> Text,
        ativo -> Bool,
    }
}

diesel::table! {
    unidade (id) {
        id -> BigInt,
        nome -> Text,
        status -> Bool,
    }
}

diesel::table! {
    ref_vacinas (id) {
        #[sql_name = "ref_vacinasID"]
        id -> BigInt,
        nome -> Text,
        preco -> Double,
        status -> Bool,
    }
}

diesel::table! {
    convenio_vacina_precos (id) {
        id -> BigInt,
        convenio_id -> BigInt,
        vacina_id -> BigInt,
        preco -> Double,
        ativo -> Bool,
    }
}

diesel::table! {
    unidade_convenios (id) {
        id -> BigInt,
        unidade_id -> BigInt,
        convenio_id -> BigInt,
        aceita -> Bool,
    }
}

diesel::joinable!(convenio_vacina_precos -> convenios (convenio_id));
diesel::joinable!(convenio_vacina_precos -> ref_vacinas (vacina_id));
diesel::joinable!(unidade_convenios -> convenios (convenio_id));
diesel::joinable!(unidade_convenios -> unidade (unidade_id));

diesel::allow_tables_to_appear_in_same_query!(
    convenios,
    unidade,
    ref_vacinas,
    convenio_vacina_precos,
    unidade_convenios,
);
