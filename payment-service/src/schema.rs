diesel::table! {
    payments (id) {
        id -> Int4,
        order_id -> Int4,
        user_id -> Int4,
        amount -> Float8,
        currency -> Varchar,
        payment_method -> Varchar,
        status -> Varchar,
        transaction_id -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Nullable<Timestamptz>,
    }
}
