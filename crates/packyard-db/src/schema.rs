diesel::table! {
    packages (id) {
        id -> Integer,
        name -> Nullable<Text>,
        repository -> Text,
        credentials -> Nullable<Text>,
        vcs_driver_error -> Nullable<Text>,
        update_failure_notified -> Bool,
        created_at -> Text,
    }
}

diesel::table! {
    versions (id) {
        id -> Integer,
        package_id -> Integer,
        version -> Text,
        version_normalized -> Text,
        version_normalized_v2 -> Nullable<Text>,
        released_at -> Nullable<Text>,
        metadata -> Jsonb,
    }
}

diesel::table! {
    maintainers (id) {
        id -> Integer,
        username -> Text,
        email -> Text,
        failure_notifications -> Bool,
    }
}

diesel::table! {
    package_maintainers (package_id, maintainer_id) {
        package_id -> Integer,
        maintainer_id -> Integer,
    }
}

diesel::table! {
    package_grants (user_id, package_id) {
        user_id -> BigInt,
        package_id -> Integer,
    }
}

diesel::table! {
    provider_index (name) {
        name -> Text,
        last_modified -> Text,
    }
}

diesel::joinable!(versions -> packages (package_id));
diesel::joinable!(package_maintainers -> packages (package_id));
diesel::joinable!(package_maintainers -> maintainers (maintainer_id));
diesel::joinable!(package_grants -> packages (package_id));

diesel::allow_tables_to_appear_in_same_query!(
    packages,
    versions,
    maintainers,
    package_maintainers,
    package_grants,
    provider_index,
);
