use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// 容量上限付きのLRUキャッシュ
///
/// アクセス順は `stamp`（単調増加）をキーにした順序付きマップで管理する。
/// 参照のたびに古いstampを外して新しいstampで入れ直す（touch）。
///
/// 追い出しは新しいキーを挿入する直前に判定するため、
/// マップは瞬間的に `capacity + 1` 件まで保持しうる。
#[derive(Debug)]
pub struct RecencyCache<K, V> {
    capacity: usize,
    entries: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    clock: u64,
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    stamp: u64,
}

impl<K, V> RecencyCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: BTreeMap::new(),
            clock: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// 値を取得する。存在しなければ空の値を作成して格納する
    ///
    /// どちらの場合も最新アクセスとして記録される。
    pub fn get(&mut self, key: &K) -> &mut V
    where
        V: Default,
    {
        if self.entries.contains_key(key) {
            self.touch(key);
        } else {
            self.set(key.clone(), V::default());
        }
        self.entries
            .get_mut(key)
            .map(|slot| &mut slot.value)
            .expect("entry exists after get-or-create")
    }

    /// アクセス順を変えずに参照する
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// 値を挿入（置換）し、最新アクセスとして記録する
    ///
    /// 新しいキーの挿入時にマップが容量を超えていれば、
    /// 最も古いエントリを1件だけ追い出す。
    pub fn set(&mut self, key: K, value: V) {
        if let Some(slot) = self.entries.get_mut(&key) {
            slot.value = value;
            self.touch(&key);
            return;
        }

        if self.entries.len() > self.capacity {
            self.evict_oldest();
        }

        let stamp = self.next_stamp();
        self.order.insert(stamp, key.clone());
        self.entries.insert(key, Slot { value, stamp });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// 古い順にキーを列挙
    pub fn keys_by_recency(&self) -> impl Iterator<Item = &K> {
        self.order.values()
    }

    fn touch(&mut self, key: &K) {
        let stamp = self.next_stamp();
        if let Some(slot) = self.entries.get_mut(key) {
            let previous = std::mem::replace(&mut slot.stamp, stamp);
            if let Some(key) = self.order.remove(&previous) {
                self.order.insert(stamp, key);
            }
        }
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.order.pop_first() {
            self.entries.remove(&key);
        }
    }

    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}
