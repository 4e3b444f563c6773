use redis::{Client, Commands, Connection, FromRedisValue, RedisResult, ToRedisArgs};

pub struct Redis {}

impl Redis {
    pub fn connect(redis_url: &str) -> RedisResult<Connection> {
        Client::open(redis_url)?.get_connection()
    }

    pub fn set_data<K: ToRedisArgs, D: ToRedisArgs>(conn: &mut Connection, key: K, data: D) -> RedisResult<()> {
        conn.set::<K, D, ()>(key, data)
    }

    pub fn get_data<K: ToRedisArgs, D: FromRedisValue>(conn: &mut Connection, key: K) -> RedisResult<Option<D>> {
        conn.get::<K, Option<D>>(key)
    }

    pub fn delete<K: ToRedisArgs>(conn: &mut Connection, key: K) -> RedisResult<()> {
        conn.del::<K, ()>(key)
    }

    pub fn keys<K: ToRedisArgs>(conn: &mut Connection, pattern: K) -> RedisResult<Vec<String>> {
        conn.keys(pattern)
    }

    pub fn increment<K: ToRedisArgs>(conn: &mut Connection, key: K) -> RedisResult<u64> {
        conn.incr::<K, u64, u64>(key, 1)
    }

    /// # guarded set
    /// set `key` only while `guard` still holds `expected`, a missing guard
    /// counts as 0. the guard is watched so the check and the set are one
    /// transaction.
    ///
    /// ## Returns
    /// * `bool` - whether the value was written
    pub fn set_if_unchanged(conn: &mut Connection, guard: &str, expected: u64, key: &str, data: &str) -> RedisResult<bool> {
        redis::transaction(conn, &[guard], |conn, pipe| {
            let current: Option<u64> = conn.get(guard)?;
            if current.unwrap_or(0) != expected {
                return Ok(Some(false));
            }
            let written: Option<()> = pipe.set(key, data).ignore().query(conn)?;
            Ok(written.map(|_| true))
        })
    }
}
