/// 입찰 대상 상품 잠금 (같은 상품의 입찰을 직렬화)
pub const LOCK_ITEM_FOR_BID: &str =
    "SELECT opening_bid, min_bid_incr FROM items WHERE id = $1 FOR UPDATE";

/// 최고 입찰 조회
pub const GET_LEADING_BID: &str = r#"
    SELECT bidder, amount
    FROM bids
    WHERE item_id = $1
    ORDER BY amount DESC, created_at DESC, id DESC
    LIMIT 1
"#;

/// 입찰 추가
pub const INSERT_BID: &str =
    "INSERT INTO bids (item_id, bidder, amount, created_at) VALUES ($1, $2, $3, $4)";

/// 상품 생성
pub const INSERT_ITEM: &str = r#"
    INSERT INTO items (title, description, artist, image_file_name, opening_bid, min_bid_incr)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, title, description, artist, image_file_name, opening_bid, min_bid_incr, created_at
"#;

/// 상품 수정
pub const UPDATE_ITEM: &str = r#"
    UPDATE items
    SET title = $1, description = $2, artist = $3, image_file_name = $4, opening_bid = $5, min_bid_incr = $6
    WHERE id = $7
    RETURNING id, title, description, artist, image_file_name, opening_bid, min_bid_incr, created_at
"#;

const ITEM_VIEW_SELECT: &str = r#"
    SELECT items.id, items.title, items.description, items.artist, items.image_file_name,
           items.opening_bid, items.min_bid_incr, items.created_at,
           lead.bidder AS leading_bidder, lead.amount AS leading_amount, lead.created_at AS leading_at
    FROM items
    LEFT JOIN LATERAL (
        SELECT bidder, amount, created_at
        FROM bids
        WHERE bids.item_id = items.id
        ORDER BY amount DESC, created_at DESC, id DESC
        LIMIT 1
    ) lead ON TRUE
"#;

/// 상품 조회 (현재 최고 입찰 포함)
pub fn get_item_view() -> String {
    format!("{} WHERE items.id = $1", ITEM_VIEW_SELECT)
}

/// 모든 상품 조회 (현재 최고 입찰 포함)
pub fn get_all_item_views() -> String {
    format!("{} ORDER BY items.id", ITEM_VIEW_SELECT)
}

/// 상품 입찰 이력 조회
pub const GET_ITEM_BIDS: &str = r#"
    SELECT id, item_id, bidder, amount, created_at
    FROM bids
    WHERE item_id = $1
    ORDER BY created_at DESC, id DESC
"#;

/// 입찰이 있는 상품 조회
pub const GET_ITEMS_WITH_BIDS: &str = r#"
    SELECT id, title, description, artist, image_file_name, opening_bid, min_bid_incr, created_at
    FROM items
    WHERE EXISTS (SELECT 1 FROM bids WHERE bids.item_id = items.id)
    ORDER BY id
"#;

/// 모든 입찰 조회 (입찰자 연락처 포함)
pub const GET_BIDS_WITH_CONTACT: &str = r#"
    SELECT bids.id, bids.item_id, bids.bidder, bids.amount, bids.created_at,
           COALESCE(users.full_name, '<missing>') AS full_name,
           COALESCE(users.email, '<missing>') AS email
    FROM bids
    LEFT JOIN users ON bids.bidder = users.user_name
    ORDER BY bids.item_id, bids.created_at DESC, bids.id DESC
"#;

/// 낙찰자 조회
pub const GET_WINNERS: &str = r#"
    SELECT items.id AS item_id, items.title, items.artist,
           lead.amount, lead.created_at AS bid_at, lead.bidder,
           COALESCE(users.full_name, '<missing>') AS full_name,
           COALESCE(users.email, '<missing>') AS email
    FROM items
    JOIN LATERAL (
        SELECT bidder, amount, created_at
        FROM bids
        WHERE bids.item_id = items.id
        ORDER BY amount DESC, created_at DESC, id DESC
        LIMIT 1
    ) lead ON TRUE
    LEFT JOIN users ON lead.bidder = users.user_name
    ORDER BY items.id
"#;

/// 사용자 연락처 조회
pub const GET_USER_CONTACT: &str =
    "SELECT user_name, full_name, email FROM users WHERE user_name = $1";

/// 설정 값 조회
pub const GET_CONFIG_VALUE: &str = "SELECT value FROM config WHERE name = $1";
